//! Trust and completeness scoring.

use serde::Serialize;
use serde_json::Value;

use dppscan_core::doc;

use crate::format::Format;
use crate::product::extract_certifications;

/// Field counting stops past this depth; deeply nested payloads should not
/// dominate the score.
const FIELD_COUNT_MAX_DEPTH: usize = 5;

/// Derived metrics for one document. Pure function of the document and its
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub trust_score: u8,
    pub completeness_score: u8,
}

/// Score a classified document.
///
/// Trust combines a per-format base, a richness bonus (2 points per field,
/// capped at 40) and a certification bonus (10 points each, capped at 30),
/// clipped to 0–100. Completeness is the share of the format's required
/// fields that resolve to non-null values.
pub fn score(document: &Value, format: Format) -> ScoreResult {
    let base = base_score(format) as u32;
    let fields = (2 * field_count(document, 0)).min(40) as u32;
    let certs = (10 * extract_certifications(document).len()).min(30) as u32;
    let trust = (base + fields + certs).min(100) as u8;

    ScoreResult {
        trust_score: trust,
        completeness_score: completeness(document, format),
    }
}

fn base_score(format: Format) -> u8 {
    match format {
        Format::VerifiableCredential => 30,
        Format::BatteryPass => 30,
        Format::UntpPassport => 28,
        Format::SchemaOrgJsonLd => 25,
        Format::Gs1DigitalLink => 25,
        Format::IdentifierBearing => 20,
        Format::GenericJson => 15,
        Format::HtmlEmbedded => 10,
        Format::Unknown => 0,
    }
}

/// Required-field checklist per format. Entries may be dotted nested paths.
fn required_fields(format: Format) -> &'static [&'static str] {
    match format {
        Format::VerifiableCredential => {
            &["@context", "type", "credentialSubject", "issuer", "issuanceDate"]
        }
        Format::BatteryPass => &["batteryPass", "identification", "manufacturer", "sustainability"],
        Format::SchemaOrgJsonLd | Format::Gs1DigitalLink => {
            &["@context", "@type", "name", "identifier", "manufacturer"]
        }
        _ => &["name", "manufacturer", "identifier"],
    }
}

fn completeness(document: &Value, format: Format) -> u8 {
    let required = required_fields(format);
    let present = required
        .iter()
        .filter(|path| doc::lookup_path(document, path).is_some())
        .count();
    ((present as f64 / required.len() as f64) * 100.0).round() as u8
}

/// Count fields recursively, each key or array element worth one.
fn field_count(value: &Value, depth: usize) -> usize {
    if depth > FIELD_COUNT_MAX_DEPTH {
        return 0;
    }
    match value {
        Value::Object(map) => map
            .values()
            .map(|v| 1 + field_count(v, depth + 1))
            .sum(),
        Value::Array(items) => items
            .iter()
            .map(|v| 1 + field_count(v, depth + 1))
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_unknown_scores_zero() {
        let result = score(&json!({}), Format::Unknown);
        assert_eq!(result.trust_score, 0);
        assert_eq!(result.completeness_score, 0);
    }

    #[test]
    fn test_field_bonus_is_capped() {
        let mut map = serde_json::Map::new();
        for i in 0..100 {
            map.insert(format!("field{}", i), json!(i));
        }
        let result = score(&Value::Object(map), Format::Unknown);
        // 0 base + capped 40 field bonus, no certifications.
        assert_eq!(result.trust_score, 40);
    }

    #[test]
    fn test_certification_bonus_is_capped() {
        let docv = json!({
            "certifications": ["CE", "RoHS", "ISO14001", "REACH", "WEEE"]
        });
        let result = score(&docv, Format::Unknown);
        // 1 field + 5 array elements = 12 field points, certs capped at 30.
        assert_eq!(result.trust_score, 12 + 30);
    }

    #[test]
    fn test_trust_clipped_at_100() {
        let mut map = serde_json::Map::new();
        for i in 0..50 {
            map.insert(format!("field{}", i), json!(i));
        }
        map.insert(
            "certifications".to_string(),
            json!(["CE", "RoHS", "ISO14001"]),
        );
        let result = score(&Value::Object(map), Format::VerifiableCredential);
        assert_eq!(result.trust_score, 100);
    }

    #[test]
    fn test_completeness_for_credential() {
        let vc = json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "type": ["VerifiableCredential"],
            "credentialSubject": {"name": "X"},
            "issuer": "did:web:issuer.example",
            "issuanceDate": "2024-01-01T00:00:00Z"
        });
        let result = score(&vc, Format::VerifiableCredential);
        assert_eq!(result.completeness_score, 100);

        let partial = json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "credentialSubject": {}
        });
        let result = score(&partial, Format::VerifiableCredential);
        assert_eq!(result.completeness_score, 40);
    }

    #[test]
    fn test_null_required_field_counts_absent() {
        let docv = json!({"name": "X", "manufacturer": null, "identifier": "i-1"});
        let result = score(&docv, Format::GenericJson);
        assert_eq!(result.completeness_score, 67);
    }

    #[test]
    fn test_field_count_depth_cap() {
        let mut nested = json!({"leaf": 1});
        for _ in 0..10 {
            nested = json!({"inner": nested});
        }
        // Only levels within the cap contribute.
        assert_eq!(field_count(&nested, 0), 6);
    }

    #[test]
    fn test_scoring_is_pure() {
        let docv = json!({"name": "X", "certifications": ["CE"]});
        assert_eq!(
            score(&docv, Format::SchemaOrgJsonLd),
            score(&docv, Format::SchemaOrgJsonLd)
        );
    }
}
