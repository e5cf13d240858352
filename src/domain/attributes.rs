//! Attribute names and the per-item attribute bag
//!
//! The bag starts as a copy of the feed item's fields. Regex extractors only
//! add keys that are not already present; the table scan is applied last and
//! overwrites whatever it classifies (structured markup wins over regex hits
//! for the keys both produce).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::feed_item::ItemRecord;

/// Attribute keys written by the extraction engine.
pub mod keys {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const URL: &str = "url";
    pub const ERROR: &str = "error";

    pub const SIZE_DIMENSIONS: &str = "size_dimensions";
    pub const WEIGHT: &str = "weight";
    pub const COLOR: &str = "color";
    pub const MATERIAL: &str = "material";
    pub const PATTERN: &str = "pattern";
    pub const SIZE: &str = "size";

    /// Written by the table scan only; the regex extractor uses `color`.
    pub const TABLE_COLOUR: &str = "colour";

    pub const GSM: &str = "gsm";
    pub const GTIN: &str = "gtin";
    pub const MOTOR: &str = "motor";
    pub const WARRANTY: &str = "warranty";
    pub const BRAND: &str = "brand";

    /// Keys copied from the feed record rather than extracted.
    pub const BASE: [&str; 3] = [ID, TITLE, URL];

    pub fn is_base(key: &str) -> bool {
        BASE.contains(&key)
    }
}

/// Accumulating result record for one feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBag {
    #[serde(flatten)]
    fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AttributeBag {
    /// Start a bag from the feed record: `id`, `title` (when present) and `url`.
    pub fn from_record(record: &ItemRecord) -> Self {
        let mut fields = IndexMap::with_capacity(8);
        if let Some(id) = &record.id {
            fields.insert(keys::ID.to_string(), id.clone());
        }
        if let Some(title) = &record.title {
            fields.insert(keys::TITLE.to_string(), title.clone());
        }
        fields.insert(keys::URL.to_string(), record.url.clone());
        Self { fields, error: None }
    }

    pub fn url(&self) -> &str {
        self.fields.get(keys::URL).map_or("", String::as_str)
    }

    /// Look up a value by column name; `"error"` resolves to the error marker.
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == keys::ERROR {
            return self.error.as_deref();
        }
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Add an extracted value unless the key is already set.
    ///
    /// Returns `true` when the value was stored.
    pub fn insert_extracted(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.fields.contains_key(key) {
            return false;
        }
        self.fields.insert(key.to_string(), value.into());
        true
    }

    /// Layer table-derived values over the bag. Existing keys are overwritten.
    pub fn merge_structured<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in entries {
            if keys::is_base(&key) {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    /// Attach the error marker. A bag carries at most one; the first wins.
    pub fn mark_failed(&mut self, message: impl fmt::Display) {
        if self.error.is_none() {
            self.error = Some(message.to_string());
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Column names in first-seen order, excluding the error marker.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys added on top of the feed's own fields.
    pub fn extracted_keys(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|key| !keys::is_base(key))
    }

    pub fn extracted_count(&self) -> usize {
        self.extracted_keys().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ItemRecord {
        ItemRecord::new(
            Some("SKU-1".into()),
            Some("Blue Scarf".into()),
            "https://example.com/p1",
        )
    }

    #[test]
    fn starts_with_record_fields_in_order() {
        let bag = AttributeBag::from_record(&record());
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["id", "title", "url"]);
        assert_eq!(bag.url(), "https://example.com/p1");
        assert_eq!(bag.extracted_count(), 0);
    }

    #[test]
    fn missing_title_is_not_a_column() {
        let bag = AttributeBag::from_record(&ItemRecord::new(None, None, "http://x"));
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["url"]);
    }

    #[test]
    fn regex_insert_never_overwrites() {
        let mut bag = AttributeBag::from_record(&record());
        assert!(bag.insert_extracted(keys::WEIGHT, "Weight: 2 kg"));
        assert!(!bag.insert_extracted(keys::WEIGHT, "3 kg"));
        assert!(!bag.insert_extracted(keys::URL, "http://other"));
        assert_eq!(bag.get(keys::WEIGHT), Some("Weight: 2 kg"));
        assert_eq!(bag.url(), "https://example.com/p1");
    }

    #[test]
    fn structured_merge_overwrites_but_keeps_base_fields() {
        let mut bag = AttributeBag::from_record(&record());
        bag.insert_extracted(keys::WEIGHT, "Weight: 2 kg");
        bag.merge_structured(vec![
            ("weight".to_string(), "2.4 kg".to_string()),
            ("url".to_string(), "http://evil".to_string()),
            ("colour".to_string(), "Navy".to_string()),
        ]);
        assert_eq!(bag.get(keys::WEIGHT), Some("2.4 kg"));
        assert_eq!(bag.get(keys::TABLE_COLOUR), Some("Navy"));
        assert_eq!(bag.url(), "https://example.com/p1");
    }

    #[test]
    fn first_error_marker_wins() {
        let mut bag = AttributeBag::from_record(&record());
        bag.mark_failed("Request error: timed out");
        bag.mark_failed("Processing error: later");
        assert!(bag.is_failed());
        assert_eq!(bag.get("error"), Some("Request error: timed out"));
    }

    #[test]
    fn serializes_flat_with_error_last() {
        let mut bag = AttributeBag::from_record(&record());
        bag.insert_extracted(keys::COLOR, "Blue");
        bag.mark_failed("Processing error: boom");
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(
            json,
            r#"{"id":"SKU-1","title":"Blue Scarf","url":"https://example.com/p1","color":"Blue","error":"Processing error: boom"}"#
        );
    }
}
