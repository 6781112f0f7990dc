//! Certification and product-info extraction.

use serde::Serialize;
use serde_json::Value;

use dppscan_core::doc;

use crate::format::Format;

/// Locations where certifications commonly live.
const CERTIFICATION_PATHS: &[&str] = &[
    "certifications",
    "certification",
    "credentialSubject.certifications",
    "sustainability.certifications",
    "batteryPass.certifications",
    "certificateOfCompliance",
];

/// Collect certification names from the usual field locations,
/// deduplicated in discovery order.
pub fn extract_certifications(document: &Value) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |name: Option<String>, found: &mut Vec<String>| {
        if let Some(name) = name {
            if !name.is_empty() && !found.contains(&name) {
                found.push(name);
            }
        }
    };

    for path in CERTIFICATION_PATHS {
        let Some(field) = doc::lookup_path(document, path) else {
            continue;
        };
        match field {
            Value::Array(items) => {
                for item in items {
                    push(certification_name(item), &mut found);
                }
            }
            other => push(certification_name(other), &mut found),
        }
    }

    found
}

fn certification_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("type"))
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Core product attributes pulled from format-specific field locations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Pull name/manufacturer/category/identifier out of a document, looking
/// where the classified format keeps them.
pub fn extract_product_info(document: &Value, format: Format) -> ProductInfo {
    match format {
        Format::VerifiableCredential => {
            if let Some(subject) = document.get("credentialSubject") {
                return ProductInfo {
                    name: first_string(subject, &["name", "productName"]),
                    manufacturer: first_string(subject, &["manufacturer", "manufacturerName"]),
                    category: first_string(subject, &["category", "productCategory"]),
                    identifier: first_string(subject, &["identifier", "id"]),
                };
            }
            generic_info(document)
        }
        Format::BatteryPass => {
            if let Some(pass) = document.get("batteryPass") {
                return ProductInfo {
                    name: first_string(pass, &["productName"]),
                    manufacturer: doc::lookup_path(pass, "manufacturer.name")
                        .and_then(Value::as_str)
                        .map(String::from),
                    category: Some("Battery".to_string()),
                    identifier: doc::lookup_path(pass, "identification.id")
                        .and_then(Value::as_str)
                        .map(String::from),
                };
            }
            generic_info(document)
        }
        _ => generic_info(document),
    }
}

fn generic_info(document: &Value) -> ProductInfo {
    ProductInfo {
        name: first_string(document, &["name", "productName", "title"]),
        manufacturer: first_string(document, &["manufacturer", "brand", "vendor"]),
        category: first_string(document, &["category", "productCategory", doc::TYPE_KEY]),
        identifier: first_string(document, &["identifier", "id", "gtin", "sku"]),
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_str).map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_certifications_from_string_array() {
        let docv = json!({"certifications": ["CE", "RoHS"]});
        assert_eq!(extract_certifications(&docv), vec!["CE", "RoHS"]);
    }

    #[test]
    fn test_certifications_from_objects_and_nested_paths() {
        let docv = json!({
            "sustainability": {"certifications": [{"name": "ISO 14001"}, {"type": "EPD"}]},
            "certificateOfCompliance": "CE"
        });
        let certs = extract_certifications(&docv);
        assert_eq!(certs, vec!["ISO 14001", "EPD", "CE"]);
    }

    #[test]
    fn test_certifications_deduplicate() {
        let docv = json!({
            "certifications": ["CE"],
            "certification": "CE"
        });
        assert_eq!(extract_certifications(&docv), vec!["CE"]);
    }

    #[test]
    fn test_no_certifications() {
        assert!(extract_certifications(&json!({"name": "X"})).is_empty());
    }

    #[test]
    fn test_product_info_from_credential_subject() {
        let vc = json!({
            "credentialSubject": {
                "productName": "Widget",
                "manufacturerName": "Acme",
                "id": "urn:widget:1"
            }
        });
        let info = extract_product_info(&vc, Format::VerifiableCredential);
        assert_eq!(info.name.as_deref(), Some("Widget"));
        assert_eq!(info.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(info.identifier.as_deref(), Some("urn:widget:1"));
    }

    #[test]
    fn test_product_info_from_battery_pass() {
        let pass = json!({
            "batteryPass": {
                "productName": "Cell Block",
                "manufacturer": {"name": "VoltCo"},
                "identification": {"id": "batt-9"}
            }
        });
        let info = extract_product_info(&pass, Format::BatteryPass);
        assert_eq!(info.name.as_deref(), Some("Cell Block"));
        assert_eq!(info.manufacturer.as_deref(), Some("VoltCo"));
        assert_eq!(info.category.as_deref(), Some("Battery"));
        assert_eq!(info.identifier.as_deref(), Some("batt-9"));
    }

    #[test]
    fn test_generic_fallback() {
        let docv = json!({"title": "Thing", "brand": "Maker", "gtin": "0123"});
        let info = extract_product_info(&docv, Format::GenericJson);
        assert_eq!(info.name.as_deref(), Some("Thing"));
        assert_eq!(info.manufacturer.as_deref(), Some("Maker"));
        assert_eq!(info.identifier.as_deref(), Some("0123"));
    }
}
