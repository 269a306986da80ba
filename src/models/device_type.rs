//! Device type taxonomy model: definitions, pattern specs, and icon templates.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::TaxonomyError;

/// Broad class a device type belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Infrastructure,
    Endpoint,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Endpoint => write!(f, "endpoint"),
        }
    }
}

/// How a single pattern treats letter case.
///
/// Vendor model codes (`FG-\d+`) are matched exactly; free-text device
/// words (`laptop`) are matched case-insensitively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternCase {
    Sensitive,
    Insensitive,
}

/// Uncompiled pattern as written in the taxonomy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub regex: String,
    pub case: PatternCase,
}

impl PatternSpec {
    pub fn sensitive(regex: &str) -> Self {
        Self {
            regex: regex.to_string(),
            case: PatternCase::Sensitive,
        }
    }

    pub fn insensitive(regex: &str) -> Self {
        Self {
            regex: regex.to_string(),
            case: PatternCase::Insensitive,
        }
    }
}

/// Icon directory, default icon, and model-specific overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconTemplate {
    pub dir: String,
    pub default_icon: String,
    #[serde(default)]
    pub model_icons: Vec<(String, String)>,
}

impl IconTemplate {
    /// Pick the icon file for the first identifier that names a known model.
    ///
    /// Exact model matches win over case-insensitive ones; otherwise the
    /// default icon is used.
    pub fn icon_file<'a>(&'a self, identifiers: &[&str]) -> &'a str {
        for identifier in identifiers {
            if let Some((_, file)) = self.model_icons.iter().find(|(m, _)| m == identifier) {
                return file;
            }
        }
        for identifier in identifiers {
            if let Some((_, file)) = self
                .model_icons
                .iter()
                .find(|(m, _)| m.eq_ignore_ascii_case(identifier))
            {
                return file;
            }
        }
        &self.default_icon
    }

    /// Relative icon path: `{dir}/{file}`.
    pub fn icon_path(&self, file: &str) -> String {
        format!("{}/{}", self.dir, file)
    }
}

/// Uncompiled device type definition. Serde-enabled so a taxonomy can be
/// supplied as JSON instead of the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeSpec {
    pub type_id: String,
    pub vendor: String,
    pub category: String,
    pub class: DeviceClass,
    pub color: String,
    pub priority: i32,
    pub base_confidence: f32,
    pub icon: IconTemplate,
    pub patterns: Vec<PatternSpec>,
}

/// A compiled pattern, keeping its source text for reporting.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub case: PatternCase,
    pub regex: Regex,
}

impl CompiledPattern {
    fn compile(type_id: &str, spec: &PatternSpec) -> Result<Self, TaxonomyError> {
        let regex = RegexBuilder::new(&spec.regex)
            .case_insensitive(spec.case == PatternCase::Insensitive)
            .build()
            .map_err(|e| TaxonomyError::InvalidPattern {
                type_id: type_id.to_string(),
                pattern: spec.regex.clone(),
                source: e,
            })?;
        Ok(Self {
            source: spec.regex.clone(),
            case: spec.case,
            regex,
        })
    }
}

/// Immutable device type definition with compiled patterns.
#[derive(Debug, Clone)]
pub struct DeviceTypeDefinition {
    pub type_id: String,
    pub vendor: String,
    pub category: String,
    pub class: DeviceClass,
    pub color: String,
    pub priority: i32,
    pub base_confidence: f32,
    pub icon: IconTemplate,
    pub patterns: Vec<CompiledPattern>,
}

impl DeviceTypeDefinition {
    /// Compile a spec, rejecting invalid regexes and confidences outside (0, 1].
    pub fn compile(spec: DeviceTypeSpec) -> Result<Self, TaxonomyError> {
        if !(spec.base_confidence > 0.0 && spec.base_confidence <= 1.0) {
            return Err(TaxonomyError::InvalidConfidence {
                type_id: spec.type_id,
                value: spec.base_confidence,
            });
        }

        let patterns = spec
            .patterns
            .iter()
            .map(|p| CompiledPattern::compile(&spec.type_id, p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            type_id: spec.type_id,
            vendor: spec.vendor,
            category: spec.category,
            class: spec.class,
            color: spec.color,
            priority: spec.priority,
            base_confidence: spec.base_confidence,
            icon: spec.icon,
            patterns,
        })
    }
}

/// Public summary of a device type (no patterns).
#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeSummary {
    pub type_id: String,
    pub vendor: String,
    pub category: String,
    pub class: DeviceClass,
    pub color: String,
    pub priority: i32,
}

impl From<&DeviceTypeDefinition> for DeviceTypeSummary {
    fn from(def: &DeviceTypeDefinition) -> Self {
        Self {
            type_id: def.type_id.clone(),
            vendor: def.vendor.clone(),
            category: def.category.clone(),
            class: def.class,
            color: def.color.clone(),
            priority: def.priority,
        }
    }
}

/// Full vendor listing entry, including pattern sources and icon template.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeDetail {
    #[serde(flatten)]
    pub summary: DeviceTypeSummary,
    pub base_confidence: f32,
    pub patterns: Vec<String>,
    pub icon: IconTemplate,
}

impl From<&DeviceTypeDefinition> for DeviceTypeDetail {
    fn from(def: &DeviceTypeDefinition) -> Self {
        Self {
            summary: def.into(),
            base_confidence: def.base_confidence,
            patterns: def.patterns.iter().map(|p| p.source.clone()).collect(),
            icon: def.icon.clone(),
        }
    }
}
