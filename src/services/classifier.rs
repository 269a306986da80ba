//! Device classifier: maps free-text identifiers to a device type.

use std::sync::Arc;

use crate::models::classification::ClassificationResult;
use crate::services::matcher;
use crate::services::taxonomy::TaxonomyRegistry;

/// Public classification entry point over an injected registry.
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    registry: Arc<TaxonomyRegistry>,
}

impl DeviceClassifier {
    pub fn new(registry: Arc<TaxonomyRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaxonomyRegistry {
        &self.registry
    }

    /// Classify a device from its identifiers (system name, model, hostname).
    ///
    /// Returns the `generic-device` sentinel with confidence 0 when nothing
    /// matches or every identifier is blank.
    pub fn classify(&self, identifiers: &[&str]) -> ClassificationResult {
        let ranked = matcher::rank(matcher::candidates(&self.registry, identifiers));

        let Some(best) = ranked.into_iter().next() else {
            tracing::debug!(?identifiers, "No device type matched");
            return ClassificationResult::generic();
        };

        let def = &self.registry.definitions()[best.registry_index];
        let trimmed: Vec<&str> = identifiers.iter().map(|s| s.trim()).collect();
        let icon_file = def.icon.icon_file(&trimmed).to_string();

        tracing::debug!(
            type_id = %def.type_id,
            confidence = best.confidence,
            identifier = %best.matched_identifier,
            pattern = %best.matched_pattern,
            "Device classified"
        );

        ClassificationResult {
            type_id: def.type_id.clone(),
            vendor: def.vendor.clone(),
            category: def.category.clone(),
            class: def.class,
            color: def.color.clone(),
            icon_path: def.icon.icon_path(&icon_file),
            icon_file,
            confidence: best.confidence,
            matched_identifier: Some(best.matched_identifier),
            matched_pattern: Some(best.matched_pattern),
        }
    }
}
