//! The metadata record stored and returned for each URL

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata describing a single URL
///
/// `url` is always the *normalized* form — two raw spellings that normalize
/// identically share exactly one record. Beyond the fixed fields the record
/// is an open bag: site extractors may attach additional named fields (for
/// example `subtitles`), which serialize alongside the core ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// The normalized URL this record describes
    pub url: String,

    /// When the record was first built; never updated afterwards
    pub timestamp: DateTime<Utc>,

    /// Generic fields from the fetch step (title, description, images, ...);
    /// absent if the fetch failed entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Map<String, Value>>,

    /// Minified plain-text rendering of the fetched page; present only when
    /// a fetch succeeded with a non-error status and non-empty content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_summary: Option<String>,

    /// Extractor-contributed fields, flattened into the serialized record
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Create an empty record for a normalized URL
    pub fn new(url: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            timestamp,
            info: None,
            html_summary: None,
            extra: BTreeMap::new(),
        }
    }

    /// Look up a generic info field by name
    pub fn info_field(&self, name: &str) -> Option<&Value> {
        self.info.as_ref().and_then(|info| info.get(name))
    }

    /// The page title from the generic info, if any
    pub fn title(&self) -> Option<&str> {
        self.info_field("title").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_omitted() {
        let meta = Metadata::new("https://example.com", Utc::now());
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"url\":\"https://example.com\""));
        assert!(!json.contains("info"));
        assert!(!json.contains("html_summary"));
    }

    #[test]
    fn test_extra_fields_flatten() {
        let mut meta = Metadata::new("https://example.com", Utc::now());
        meta.extra
            .insert("subtitles".to_string(), json!("hello world"));
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"subtitles\":\"hello world\""));

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.extra.get("subtitles"), Some(&json!("hello world")));
    }

    #[test]
    fn test_roundtrip_preserves_timestamp() {
        let meta = Metadata::new("https://example.com", Utc::now());
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_title_accessor() {
        let mut meta = Metadata::new("https://example.com", Utc::now());
        assert_eq!(meta.title(), None);

        let mut info = Map::new();
        info.insert("title".to_string(), json!("Example Domain"));
        meta.info = Some(info);
        assert_eq!(meta.title(), Some("Example Domain"));
    }
}
