//! Classification candidates, results, and request DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::device_type::DeviceClass;

/// Reserved type id returned when no definition matches.
pub const GENERIC_DEVICE: &str = "generic-device";

/// A definition that matched one of the input identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationCandidate {
    /// Position of the definition in the registry (final tie-break).
    pub registry_index: usize,
    pub type_id: String,
    pub confidence: f32,
    pub priority: i32,
    pub matched_identifier: String,
    pub matched_pattern: String,
}

/// Outcome of classifying a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub type_id: String,
    pub vendor: String,
    pub category: String,
    pub class: DeviceClass,
    pub color: String,
    pub icon_path: String,
    pub icon_file: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
}

impl ClassificationResult {
    /// Sentinel result for unclassifiable input.
    pub fn generic() -> Self {
        Self {
            type_id: GENERIC_DEVICE.to_string(),
            vendor: "Generic".to_string(),
            category: "unknown".to_string(),
            class: DeviceClass::Infrastructure,
            color: "#7F8C8D".to_string(),
            icon_path: "generic/device.svg".to_string(),
            icon_file: "device.svg".to_string(),
            confidence: 0.0,
            matched_identifier: None,
            matched_pattern: None,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.type_id == GENERIC_DEVICE
    }

    /// Full icon URL under the given base, e.g. `/nedi/icon_library/fortigate/fortigate.svg`.
    pub fn icon_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.icon_path)
    }
}

/// Named device identifiers as reported by discovery.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(max = 255))]
    pub sysname: Option<String>,
    #[validate(length(max = 255))]
    pub model: Option<String>,
    #[validate(length(max = 255))]
    pub hostname: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub identifiers: Vec<String>,
}

impl ClassifyRequest {
    /// Identifiers in evaluation order: sysname, model, hostname, then extras.
    pub fn identifiers(&self) -> Vec<&str> {
        [&self.sysname, &self.model, &self.hostname]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .chain(self.identifiers.iter().map(String::as_str))
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.identifiers().iter().all(|s| s.trim().is_empty())
    }
}

/// Classification response including the resolved icon URL.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub icon_url: String,
}
