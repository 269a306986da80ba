//! Pattern matcher: evaluates identifiers against every registry definition.
//!
//! Stateless and reentrant; it only reads the registry it is handed.

use crate::models::classification::ClassificationCandidate;
use crate::services::taxonomy::TaxonomyRegistry;

/// Produce at most one candidate per definition, in registry order.
///
/// For each definition, identifiers are tried in input order and patterns
/// in definition order; the first hit records a candidate carrying the
/// definition's base confidence and ends evaluation of that definition.
/// Blank identifiers are ignored.
pub fn candidates(registry: &TaxonomyRegistry, identifiers: &[&str]) -> Vec<ClassificationCandidate> {
    let identifiers: Vec<&str> = identifiers
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if identifiers.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();

    'definitions: for (index, def) in registry.definitions().iter().enumerate() {
        for identifier in &identifiers {
            for pattern in &def.patterns {
                if pattern.regex.is_match(identifier) {
                    found.push(ClassificationCandidate {
                        registry_index: index,
                        type_id: def.type_id.clone(),
                        confidence: def.base_confidence,
                        priority: def.priority,
                        matched_identifier: identifier.to_string(),
                        matched_pattern: pattern.source.clone(),
                    });
                    continue 'definitions;
                }
            }
        }
    }

    found
}

/// Rank candidates best-first: confidence, then priority, then registry order.
pub fn rank(mut candidates: Vec<ClassificationCandidate>) -> Vec<ClassificationCandidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.registry_index.cmp(&b.registry_index))
    });
    candidates
}
