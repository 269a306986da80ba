//! Identifier resolution model: cache entries, resolutions, hints, and source config.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Source label for values served from the resolution cache.
pub const SOURCE_CACHE: &str = "cache";
/// Source label for values produced by the ASCII heuristic decoder.
pub const SOURCE_ASCII_DECODE: &str = "ascii-decode";
/// Source label for identifiers nothing could improve on.
pub const SOURCE_UNRESOLVED: &str = "unresolved";

/// Persisted resolution keyed by the exact raw identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

/// A name produced by one lookup source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHit {
    pub name: String,
    pub description: Option<String>,
}

impl SourceHit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Device-type prefix that accompanied an identifier, e.g. `FortiAP`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeHint(pub String);

impl DeviceTypeHint {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split `FortiAP-1.16.70.80` into (`Some(FortiAP)`, `1.16.70.80`).
    ///
    /// The identifier starts at the first `-` followed by a digit. Input
    /// without such a split is returned whole with no hint.
    pub fn split(device_name: &str) -> (Option<Self>, &str) {
        let bytes = device_name.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'-' && i > 0 && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                return (Some(Self::new(&device_name[..i])), &device_name[i + 1..]);
            }
        }
        (None, device_name)
    }

    /// `{hint}-{name}`.
    pub fn apply(&self, name: &str) -> String {
        format!("{}-{}", self.0, name)
    }
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub identifier: String,
    pub name: String,
    pub display_name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.source != SOURCE_UNRESOLVED
    }
}

/// Position and timeout of one member of the lookup chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSourceConfig {
    pub name: String,
    pub priority_order: usize,
    pub timeout: Duration,
}

/// Request body for `POST /api/v1/resolve`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(min = 1, max = 1024))]
    pub identifier: String,
    #[validate(length(min = 1, max = 64))]
    pub hint: Option<String>,
}
