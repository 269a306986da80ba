//! Taxonomy registry: the ordered, immutable set of device type definitions.
//!
//! Built once at startup (from the built-in table or a JSON document) and
//! shared by reference. Registry order is significant: it is the final
//! tie-break when two definitions match with equal confidence and priority.

use std::collections::HashSet;

use serde::Serialize;

use crate::errors::TaxonomyError;
use crate::models::device_type::{
    DeviceClass, DeviceTypeDefinition, DeviceTypeDetail, DeviceTypeSpec, DeviceTypeSummary,
    IconTemplate, PatternSpec,
};

/// Immutable, ordered device type registry.
#[derive(Debug, Clone)]
pub struct TaxonomyRegistry {
    definitions: Vec<DeviceTypeDefinition>,
}

/// Icon mapping export consumed by frontends.
#[derive(Debug, Serialize)]
pub struct TaxonomyExport {
    pub device_types: Vec<DeviceTypeSummary>,
    pub vendors: Vec<String>,
    pub icon_base_path: String,
    pub total_types: usize,
}

impl TaxonomyRegistry {
    /// Compile and validate a list of specs, preserving their order.
    pub fn from_specs(specs: Vec<DeviceTypeSpec>) -> Result<Self, TaxonomyError> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.type_id.clone()) {
                return Err(TaxonomyError::DuplicateTypeId(spec.type_id));
            }
            definitions.push(DeviceTypeDefinition::compile(spec)?);
        }

        tracing::debug!(definitions = definitions.len(), "Taxonomy registry loaded");
        Ok(Self { definitions })
    }

    /// Parse a JSON array of device type specs.
    pub fn from_json(json: &str) -> Result<Self, TaxonomyError> {
        let specs: Vec<DeviceTypeSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// The built-in network device taxonomy.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Self::from_specs(builtin_specs())
    }

    pub fn definitions(&self) -> &[DeviceTypeDefinition] {
        &self.definitions
    }

    pub fn get(&self, type_id: &str) -> Option<&DeviceTypeDefinition> {
        self.definitions.iter().find(|d| d.type_id == type_id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn all_device_types(&self) -> Vec<DeviceTypeSummary> {
        self.definitions.iter().map(Into::into).collect()
    }

    /// Definitions for one vendor (case-insensitive vendor name).
    pub fn vendor_devices(&self, vendor: &str) -> Vec<DeviceTypeDetail> {
        self.definitions
            .iter()
            .filter(|d| d.vendor.eq_ignore_ascii_case(vendor))
            .map(Into::into)
            .collect()
    }

    /// Distinct vendor names, sorted.
    pub fn vendors(&self) -> Vec<String> {
        let mut vendors: Vec<String> = self.definitions.iter().map(|d| d.vendor.clone()).collect();
        vendors.sort();
        vendors.dedup();
        vendors
    }

    pub fn export_mapping(&self, icon_base_path: &str) -> TaxonomyExport {
        TaxonomyExport {
            device_types: self.all_device_types(),
            vendors: self.vendors(),
            icon_base_path: icon_base_path.to_string(),
            total_types: self.definitions.len(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn device(
    type_id: &str,
    vendor: &str,
    category: &str,
    class: DeviceClass,
    color: &str,
    priority: i32,
    base_confidence: f32,
    icon_dir: &str,
    default_icon: &str,
    model_icons: &[(&str, &str)],
    patterns: Vec<PatternSpec>,
) -> DeviceTypeSpec {
    DeviceTypeSpec {
        type_id: type_id.to_string(),
        vendor: vendor.to_string(),
        category: category.to_string(),
        class,
        color: color.to_string(),
        priority,
        base_confidence,
        icon: IconTemplate {
            dir: icon_dir.to_string(),
            default_icon: default_icon.to_string(),
            model_icons: model_icons
                .iter()
                .map(|(m, f)| (m.to_string(), f.to_string()))
                .collect(),
        },
        patterns,
    }
}

const FORTINET_ORANGE: &str = "#E5A100";
const FORTINET_DARK: &str = "#D4A017";
const MERAKI_CYAN: &str = "#00BCD4";
const CISCO_BLUE: &str = "#0066CC";

/// Built-in taxonomy table, in registry order.
#[rustfmt::skip]
pub fn builtin_specs() -> Vec<DeviceTypeSpec> {
    use DeviceClass::{Endpoint, Infrastructure};
    use PatternSpec as P;

    vec![
        // Fortinet
        device(
            "fortigate", "Fortinet", "firewall", Infrastructure, FORTINET_ORANGE, 100, 0.9,
            "fortigate", "fortigate.svg",
            &[
                ("FG-3100D", "fortigate-3100D.svg"),
                ("FG-1000D", "fortigate-1000D.svg"),
                ("FG-600D", "fortigate-600D.svg"),
                ("FG-3950", "fortigate-3950.svg"),
                ("FWF-60F", "fortiwifi-60F.svg"),
                ("FWF-61F", "fortiwifi-61F.svg"),
            ],
            vec![
                P::sensitive(r"FG-\d+"),
                P::sensitive(r"FWF-\d+"),
                P::insensitive("FortiGate"),
                P::insensitive("Forti.*Gate"),
            ],
        ),
        device(
            "fortiswitch", "Fortinet", "switch", Infrastructure, FORTINET_ORANGE, 90, 0.9,
            "fortiswitch", "fortiswitch.svg",
            &[
                ("FSW-48F", "fortiswitch-48F.svg"),
                ("FSW-248D", "fortiswitch-248D.svg"),
                ("FSW-1024D", "fortiswitch-1024D.svg"),
                ("FSW-524D", "fortiswitch-524D.svg"),
            ],
            vec![
                P::sensitive(r"FSW-\d+"),
                P::sensitive(r"FS-\d+"),
                P::insensitive("FortiSwitch"),
                P::insensitive("Forti.*Switch"),
            ],
        ),
        device(
            "fortiap", "Fortinet", "access_point", Infrastructure, FORTINET_ORANGE, 85, 0.9,
            "fortiap", "fortiap.svg",
            &[
                ("FAP-432F", "fortiap-432F.svg"),
                ("FAP-222B", "fortiap-222B.svg"),
                ("FAP-221C", "fortiap-221C.svg"),
                ("FAP-231F", "fortiap-231F.svg"),
            ],
            vec![
                P::sensitive(r"FAP-\d+"),
                P::insensitive("FortiAP"),
                P::sensitive("Forti.*AP"),
            ],
        ),
        device(
            "fortimanager", "Fortinet", "management", Infrastructure, FORTINET_DARK, 95, 0.9,
            "fortimanager", "fortimanager.svg", &[],
            vec![P::sensitive(r"FMG-\d+"), P::insensitive("FortiManager")],
        ),
        device(
            "fortianalyzer", "Fortinet", "analytics", Infrastructure, FORTINET_DARK, 95, 0.9,
            "fortianalyzer", "fortianalyzer.svg", &[],
            vec![P::sensitive(r"FAZ-\d+"), P::insensitive("FortiAnalyzer")],
        ),
        // Meraki
        device(
            "meraki-firewall", "Meraki", "firewall", Infrastructure, MERAKI_CYAN, 100, 0.85,
            "meraki", "meraki-firewall.svg", &[],
            vec![
                P::sensitive(r"MX\d+"),
                P::insensitive("Meraki.*MX"),
                P::insensitive("Meraki.*Firewall"),
            ],
        ),
        device(
            "meraki-switch", "Meraki", "switch", Infrastructure, MERAKI_CYAN, 90, 0.85,
            "meraki", "meraki-switch.svg", &[],
            vec![
                P::sensitive(r"MS\d+"),
                P::insensitive("Meraki.*MS"),
                P::insensitive("Meraki.*Switch"),
            ],
        ),
        device(
            "meraki-ap", "Meraki", "access_point", Infrastructure, MERAKI_CYAN, 85, 0.85,
            "meraki", "meraki-ap.svg", &[],
            vec![
                P::sensitive(r"MR\d+"),
                P::insensitive("Meraki.*MR"),
                P::insensitive("Meraki.*AP"),
                P::insensitive("Meraki.*WiFi"),
            ],
        ),
        // Cisco
        device(
            "cisco-switch", "Cisco", "switch", Infrastructure, CISCO_BLUE, 90, 0.85,
            "cisco", "cisco-switch.svg", &[],
            vec![
                P::insensitive(r"Catalyst\s*\d+"),
                P::sensitive(r"WS-C\d+"),
                P::insensitive("Cisco.*Switch"),
            ],
        ),
        device(
            "cisco-router", "Cisco", "router", Infrastructure, CISCO_BLUE, 95, 0.85,
            "cisco", "cisco-router.svg", &[],
            vec![
                P::sensitive(r"ISR\s*\d+"),
                P::sensitive(r"ASR\s*\d+"),
                P::insensitive("Cisco.*Router"),
            ],
        ),
        // Endpoints
        device(
            "desktop", "Generic", "desktop", Endpoint, "#34495E", 10, 0.6,
            "endpoints", "desktop.svg", &[],
            vec![
                P::insensitive("desktop"),
                P::sensitive("PC"),
                P::insensitive("computer"),
                P::insensitive(r"station\s*\d+"),
            ],
        ),
        device(
            "laptop", "Generic", "laptop", Endpoint, "#2C3E50", 10, 0.6,
            "endpoints", "laptop.svg", &[],
            vec![
                P::insensitive("laptop"),
                P::insensitive("notebook"),
                P::sensitive("MacBook"),
                P::insensitive("portable"),
            ],
        ),
        device(
            "mobile", "Generic", "mobile", Endpoint, "#16A085", 10, 0.6,
            "endpoints", "mobile.svg", &[],
            vec![
                P::insensitive("mobile"),
                P::insensitive("phone"),
                P::sensitive("iPhone"),
                P::insensitive("Android"),
                P::sensitive("iPad"),
                P::insensitive("tablet"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_loads() {
        let registry = TaxonomyRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 13);
        assert_eq!(registry.definitions()[0].type_id, "fortigate");
        assert!(registry.get("meraki-ap").is_some());
        assert!(registry.get("generic-device").is_none());
    }

    #[test]
    fn duplicate_type_id_is_fatal() {
        let mut specs = builtin_specs();
        let dup = specs[0].clone();
        specs.push(dup);
        let err = TaxonomyRegistry::from_specs(specs).unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateTypeId(id) if id == "fortigate"));
    }

    #[test]
    fn vendors_are_distinct_and_sorted() {
        let registry = TaxonomyRegistry::builtin().unwrap();
        assert_eq!(
            registry.vendors(),
            vec!["Cisco", "Fortinet", "Generic", "Meraki"]
        );
    }

    #[test]
    fn vendor_devices_case_insensitive() {
        let registry = TaxonomyRegistry::builtin().unwrap();
        let cisco = registry.vendor_devices("cisco");
        assert_eq!(cisco.len(), 2);
        assert_eq!(cisco[0].summary.type_id, "cisco-switch");
        assert!(!cisco[0].patterns.is_empty());
        assert!(registry.vendor_devices("Juniper").is_empty());
    }

    #[test]
    fn export_mapping_counts_types() {
        let registry = TaxonomyRegistry::builtin().unwrap();
        let export = registry.export_mapping("/nedi/icon_library");
        assert_eq!(export.total_types, 13);
        assert_eq!(export.device_types.len(), 13);
        assert_eq!(export.icon_base_path, "/nedi/icon_library");
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["device_types"][0]["class"], "infrastructure");
    }

    #[test]
    fn json_taxonomy_round_trips_builtin() {
        let json = serde_json::to_string(&builtin_specs()).unwrap();
        let registry = TaxonomyRegistry::from_json(&json).unwrap();
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn malformed_json_taxonomy_is_rejected() {
        let err = TaxonomyRegistry::from_json("{not json").unwrap_err();
        assert!(matches!(err, TaxonomyError::Document(_)));
    }
}
