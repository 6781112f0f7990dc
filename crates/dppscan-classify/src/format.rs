//! Ordered format classification rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dppscan_core::doc;

/// Recognized schema families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    VerifiableCredential,
    BatteryPass,
    SchemaOrgJsonLd,
    Gs1DigitalLink,
    UntpPassport,
    IdentifierBearing,
    GenericJson,
    HtmlEmbedded,
    Unknown,
}

impl Format {
    /// Human-readable label for list views.
    pub fn label(&self) -> &'static str {
        match self {
            Format::VerifiableCredential => "Verifiable Credential",
            Format::BatteryPass => "Catena-X Battery Pass",
            Format::SchemaOrgJsonLd => "JSON-LD (Schema.org)",
            Format::Gs1DigitalLink => "GS1 Digital Link",
            Format::UntpPassport => "UNTP Digital Product Passport",
            Format::IdentifierBearing => "Linked Document",
            Format::GenericJson => "JSON",
            Format::HtmlEmbedded => "HTML (embedded data)",
            Format::Unknown => "Unknown",
        }
    }
}

/// The chosen family plus the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub format: Format,
    pub rule: &'static str,
}

type Predicate = fn(&Value, Option<&str>) -> bool;

/// First match wins; specificity decides the order. Several documents in
/// the wild satisfy more than one predicate (a Verifiable Credential is
/// also identifier-bearing JSON), so reordering changes results.
const RULES: &[(&str, Predicate, Format)] = &[
    ("credential context or subject", is_verifiable_credential, Format::VerifiableCredential),
    ("battery pass envelope", is_battery_pass, Format::BatteryPass),
    ("schema.org context or typed node", is_schema_org, Format::SchemaOrgJsonLd),
    ("gtin key or gs1 content type", is_gs1, Format::Gs1DigitalLink),
    ("product passport type", is_untp, Format::UntpPassport),
    ("reserved linked-data keys", is_identifier_bearing, Format::IdentifierBearing),
    ("json content type", is_generic_json, Format::GenericJson),
    ("html content type", is_html, Format::HtmlEmbedded),
];

/// Label a resolved document. Pure: identical input always yields the same
/// classification.
pub fn classify(document: &Value, content_type: Option<&str>) -> Classification {
    if !document.is_object() && !document.is_array() {
        return Classification {
            format: Format::Unknown,
            rule: "default",
        };
    }

    for (rule, predicate, format) in RULES {
        if predicate(document, content_type) {
            return Classification {
                format: *format,
                rule,
            };
        }
    }

    Classification {
        format: Format::Unknown,
        rule: "default",
    }
}

fn context_contains(document: &Value, needle: &str) -> bool {
    match document.get(doc::CONTEXT_KEY) {
        Some(Value::String(s)) => s.contains(needle),
        Some(Value::Array(items)) => items
            .iter()
            .any(|v| v.as_str().map(|s| s.contains(needle)).unwrap_or(false)),
        _ => false,
    }
}

fn type_field_contains(document: &Value, needle: &str) -> bool {
    match document.get("type") {
        Some(Value::String(s)) => s.contains(needle),
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(needle)),
        _ => false,
    }
}

fn is_verifiable_credential(document: &Value, _ct: Option<&str>) -> bool {
    context_contains(document, "credentials")
        || type_field_contains(document, "VerifiableCredential")
        || document.get("credentialSubject").is_some()
}

fn is_battery_pass(document: &Value, _ct: Option<&str>) -> bool {
    document.get("batteryPass").is_some()
        || (document.get("version").is_some() && document.get("identification").is_some())
}

fn is_schema_org(document: &Value, _ct: Option<&str>) -> bool {
    matches!(
        document.get(doc::CONTEXT_KEY).and_then(Value::as_str),
        Some("http://schema.org") | Some("https://schema.org")
    ) || matches!(document.get(doc::TYPE_KEY), Some(Value::String(_)))
}

fn is_gs1(document: &Value, content_type: Option<&str>) -> bool {
    document.get("gtin").is_some()
        || document.get("gtin13").is_some()
        || document.get("gtin14").is_some()
        || content_type.map(|ct| ct.contains("gs1")).unwrap_or(false)
}

fn is_untp(document: &Value, _ct: Option<&str>) -> bool {
    document.get("type").and_then(Value::as_str) == Some("DigitalProductPassport")
        || type_field_contains(document, "DigitalProductPassport")
        || document.get("productPassport").is_some()
}

fn is_identifier_bearing(document: &Value, _ct: Option<&str>) -> bool {
    document.get(doc::CONTEXT_KEY).is_some()
        || document.get(doc::ID_KEY).is_some()
        || document.get(doc::TYPE_KEY).is_some()
}

fn is_generic_json(_document: &Value, content_type: Option<&str>) -> bool {
    content_type.map(|ct| ct.contains("json")).unwrap_or(false)
}

fn is_html(_document: &Value, content_type: Option<&str>) -> bool {
    content_type.map(|ct| ct.contains("html")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verifiable_credential() {
        let vc = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "ProductPassportCredential"],
            "credentialSubject": {"name": "Widget"}
        });
        let c = classify(&vc, Some("application/json"));
        assert_eq!(c.format, Format::VerifiableCredential);
    }

    #[test]
    fn test_credential_subject_alone_is_enough() {
        let doc = json!({"credentialSubject": {"id": "x"}});
        assert_eq!(classify(&doc, None).format, Format::VerifiableCredential);
    }

    #[test]
    fn test_battery_pass() {
        let doc = json!({"batteryPass": {"identification": {"id": "b-1"}}});
        assert_eq!(classify(&doc, None).format, Format::BatteryPass);

        let versioned = json!({"version": "1.0", "identification": {}});
        assert_eq!(classify(&versioned, None).format, Format::BatteryPass);
    }

    #[test]
    fn test_schema_org() {
        let doc = json!({"@context": "https://schema.org", "@type": "Product"});
        assert_eq!(classify(&doc, None).format, Format::SchemaOrgJsonLd);

        let typed = json!({"@type": "Product", "name": "X"});
        assert_eq!(classify(&typed, None).format, Format::SchemaOrgJsonLd);
    }

    #[test]
    fn test_gs1() {
        let doc = json!({"gtin": "01234567890128", "name": "X"});
        assert_eq!(classify(&doc, None).format, Format::Gs1DigitalLink);

        let by_ct = json!({"name": "X"});
        assert_eq!(
            classify(&by_ct, Some("application/gs1+json")).format,
            Format::Gs1DigitalLink
        );
    }

    #[test]
    fn test_untp() {
        let doc = json!({"type": "DigitalProductPassport", "id": "x"});
        assert_eq!(classify(&doc, None).format, Format::UntpPassport);
    }

    #[test]
    fn test_identifier_bearing() {
        let doc = json!({"@id": "https://ex/a", "weight": 4});
        assert_eq!(classify(&doc, None).format, Format::IdentifierBearing);
    }

    #[test]
    fn test_generic_json_and_html() {
        let plain = json!({"weight": 4});
        assert_eq!(
            classify(&plain, Some("application/json")).format,
            Format::GenericJson
        );
        assert_eq!(classify(&plain, Some("text/html")).format, Format::HtmlEmbedded);
        assert_eq!(classify(&plain, None).format, Format::Unknown);
    }

    #[test]
    fn test_order_is_load_bearing() {
        // Satisfies both the credential rule and the schema.org rule; the
        // more specific credential rule wins.
        let both = json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "@type": "Product",
            "credentialSubject": {}
        });
        let c = classify(&both, Some("application/json"));
        assert_eq!(c.format, Format::VerifiableCredential);
        assert_eq!(c.rule, "credential context or subject");

        // gtin plus a battery pass envelope: battery pass is checked first.
        let gtin_battery = json!({"batteryPass": {}, "gtin": "0123"});
        assert_eq!(classify(&gtin_battery, None).format, Format::BatteryPass);
    }

    #[test]
    fn test_classification_is_pure() {
        let doc = json!({"@type": "Product", "gtin": "0123"});
        let a = classify(&doc, Some("application/json"));
        let b = classify(&doc, Some("application/json"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_scalar_document_is_unknown() {
        assert_eq!(classify(&json!("just a string"), None).format, Format::Unknown);
    }
}
