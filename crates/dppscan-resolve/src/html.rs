//! Embedded structured-data extraction from markup.
//!
//! Many passport endpoints only publish their data inside a rendered page:
//! a `<script type="application/ld+json">` block, a framework state blob, or
//! nothing more than `<meta>` tags.

use scraper::{Html, Selector};
use serde_json::{json, Map, Value};

/// Extract the first embedded structured-data block from an HTML page.
///
/// Checks `<script type="application/ld+json">` payloads first, then the
/// Next.js `__NEXT_DATA__` state blob (`props.pageProps`).
pub fn extract_embedded(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);

    if let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for el in document.select(&sel) {
            let text = el.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
                if !is_empty_value(&value) {
                    return Some(value);
                }
            }
        }
    }

    if let Ok(sel) = Selector::parse("script#__NEXT_DATA__") {
        if let Some(el) = document.select(&sel).next() {
            let text = el.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
                if let Some(props) = value.pointer("/props/pageProps") {
                    if !is_empty_value(props) {
                        return Some(props.clone());
                    }
                }
            }
        }
    }

    None
}

/// Synthesize a minimal document from page metadata.
///
/// Fallback when a page carries no embedded data block: `<title>`,
/// `<meta name="description">`, the canonical link, and `og:` properties.
/// Returns `None` when nothing useful is present.
pub fn page_metadata(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let mut fields = Map::new();

    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = document.select(&sel).next() {
            let title = el.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                fields.insert("title".to_string(), json!(title));
            }
        }
    }

    if let Ok(sel) = Selector::parse("meta") {
        for el in document.select(&sel) {
            let content = el.value().attr("content").unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            if let Some(name) = el.value().attr("name") {
                if name.eq_ignore_ascii_case("description") {
                    fields.insert("description".to_string(), json!(content));
                }
            }
            if let Some(property) = el.value().attr("property") {
                if let Some(key) = property.strip_prefix("og:") {
                    fields
                        .entry(format!("og_{}", key))
                        .or_insert_with(|| json!(content));
                }
            }
        }
    }

    if let Ok(sel) = Selector::parse(r#"link[rel="canonical"]"#) {
        if let Some(el) = document.select(&sel).next() {
            if let Some(href) = el.value().attr("href") {
                fields.insert("canonical".to_string(), json!(href));
            }
        }
    }

    if fields.is_empty() {
        None
    } else {
        fields.insert("source".to_string(), json!("page_metadata"));
        Some(Value::Object(fields))
    }
}

/// Whether a payload counts as "no data" for negotiation purposes.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ld_json_script() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@id":"https://ex/a","@type":"Product"}</script>
        </head><body></body></html>"#;
        let value = extract_embedded(html).unwrap();
        assert_eq!(value["@id"], "https://ex/a");
    }

    #[test]
    fn test_first_parseable_block_wins() {
        let html = r#"<html><head>
            <script type="application/ld+json">not json</script>
            <script type="application/ld+json">{"@type":"Product","name":"B"}</script>
        </head></html>"#;
        let value = extract_embedded(html).unwrap();
        assert_eq!(value["name"], "B");
    }

    #[test]
    fn test_next_data_fallback() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
                {"props":{"pageProps":{"passport":{"gtin":"0123"}}}}
            </script>
        </body></html>"#;
        let value = extract_embedded(html).unwrap();
        assert_eq!(value["passport"]["gtin"], "0123");
    }

    #[test]
    fn test_no_embedded_data() {
        assert!(extract_embedded("<html><body><p>hello</p></body></html>").is_none());
    }

    #[test]
    fn test_page_metadata() {
        let html = r#"<html><head>
            <title>Battery Pass XYZ</title>
            <meta name="description" content="A battery passport">
            <meta property="og:image" content="https://ex/img.png">
            <link rel="canonical" href="https://ex/passport/xyz">
        </head></html>"#;
        let value = page_metadata(html).unwrap();
        assert_eq!(value["title"], "Battery Pass XYZ");
        assert_eq!(value["description"], "A battery passport");
        assert_eq!(value["og_image"], "https://ex/img.png");
        assert_eq!(value["canonical"], "https://ex/passport/xyz");
    }

    #[test]
    fn test_page_metadata_empty() {
        assert!(page_metadata("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_empty_value() {
        assert!(is_empty_value(&serde_json::json!(null)));
        assert!(is_empty_value(&serde_json::json!({})));
        assert!(is_empty_value(&serde_json::json!([])));
        assert!(is_empty_value(&serde_json::json!("  ")));
        assert!(!is_empty_value(&serde_json::json!({"a": 1})));
        assert!(!is_empty_value(&serde_json::json!(0)));
    }
}
