//! Read-only view of the `meta.json` sidecar.
//!
//! The sidecar schema is open-ended, so it is held as a JSON value tree.
//! Every accessor distinguishes a missing key from a present one; nothing
//! treats an absent key as an implicit empty string.

use serde_json::Value;

use crate::error::Result;

/// Sidecar keys read by the analyzer.
pub mod keys {
    pub const BRANDING_PROJECT_NAME: &str = "brandingProjectName";
    pub const TAGS: &str = "tags";
    pub const PAGE_NUMBER_STYLE: &str = "page-number-style";
    pub const IS_RTL: &str = "isRtl";
    pub const LICENSE: &str = "license";
    pub const FEATURES: &str = "features";
    pub const LANGUAGE_DISPLAY_NAMES: &str = "language-display-names";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    root: Value,
}

impl Metadata {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(Self {
            root: serde_json::from_str(json)?,
        })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// True when the key exists at the top level, even with a `null` value.
    pub fn is_defined(&self, key: &str) -> bool {
        self.root.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// String value of `key`; `None` when absent or not a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Boolean value of `key`; `None` when absent or not a boolean.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// String entries of an array-valued key, skipping non-strings.
    ///
    /// `None` when the key is absent or not an array (including `null`).
    pub fn string_list(&self, key: &str) -> Option<Vec<&str>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    pub fn branding_project_name(&self) -> Option<&str> {
        self.str(keys::BRANDING_PROJECT_NAME)
    }

    pub fn tags(&self) -> Option<Vec<&str>> {
        self.string_list(keys::TAGS)
    }

    pub fn features(&self) -> Option<Vec<&str>> {
        self.string_list(keys::FEATURES)
    }

    pub fn page_number_style(&self) -> Option<&str> {
        self.str(keys::PAGE_NUMBER_STYLE)
    }

    pub fn is_rtl(&self) -> bool {
        self.bool(keys::IS_RTL).unwrap_or(false)
    }

    pub fn license(&self) -> Option<&str> {
        self.str(keys::LICENSE)
    }

    /// Display name for an ISO code from `language-display-names`.
    pub fn language_display_name(&self, iso_code: &str) -> Option<&str> {
        if iso_code.is_empty() {
            return None;
        }
        self.get(keys::LANGUAGE_DISPLAY_NAMES)
            .and_then(|names| names.get(iso_code))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_vs_absent() {
        let meta = Metadata::parse(r#"{"tags": null, "isRtl": true}"#).unwrap();
        assert!(meta.is_defined("tags"));
        assert_eq!(meta.tags(), None);
        assert!(!meta.is_defined("features"));
        assert!(meta.is_rtl());
    }

    #[test]
    fn test_string_list_skips_non_strings() {
        let meta = Metadata::parse(r#"{"features": ["talkingBook", 3, "signLanguage:ase"]}"#).unwrap();
        assert_eq!(
            meta.features(),
            Some(vec!["talkingBook", "signLanguage:ase"])
        );
    }

    #[test]
    fn test_language_display_names() {
        let meta =
            Metadata::parse(r#"{"language-display-names": {"en": "English", "fr": 5}}"#).unwrap();
        assert_eq!(meta.language_display_name("en"), Some("English"));
        assert_eq!(meta.language_display_name("fr"), None);
        assert_eq!(meta.language_display_name(""), None);
        assert_eq!(meta.language_display_name("tpi"), None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Metadata::parse("{not json").is_err());
    }
}
