// Adapters layer: concrete catalog providers and storage backends.

pub mod file;
pub mod http;
pub mod memory;

use crate::domain::model::Property;

/// 解析 catalog JSON：陣列，或包在 `properties` / `listings` / `data` 之下
///
/// Elements that are not objects, or lack an identifier, are skipped with a
/// warning. Every other malformed field is kept as an absent value.
pub fn parse_catalog(json: serde_json::Value) -> Vec<Property> {
    let items = match json {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => ["properties", "listings", "data"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(serde_json::Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        other => {
            tracing::warn!("⚠️ Catalog payload is not a list: {}", other);
            Vec::new()
        }
    };

    let mut properties = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(index, "⚠️ Skipping catalog entry that is not an object");
            continue;
        }
        match serde_json::from_value::<Property>(item) {
            Ok(property) => properties.push(property),
            Err(e) => tracing::warn!(index, "⚠️ Skipping catalog entry: {}", e),
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_accepts_wrapped_list() {
        let parsed = parse_catalog(serde_json::json!({
            "properties": [{"id": 1}, {"id": "b"}]
        }));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].id, "b");
    }

    #[test]
    fn test_parse_catalog_skips_unusable_entries_but_keeps_malformed_fields() {
        let parsed = parse_catalog(serde_json::json!([
            {"id": 1, "price": "call us"},
            "garbage",
            {"title": "no id"},
            {"id": 2, "price": 100}
        ]));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].price, None);
        assert_eq!(parsed[1].price, Some(100.0));
    }
}
