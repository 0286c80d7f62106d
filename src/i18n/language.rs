//! Language type: a validated language handed out by a catalog.

use crate::error::Result;
use crate::i18n::{LanguageCatalog, LanguageStrings};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A language resolved from a `LanguageCatalog`.
///
/// Only catalogs construct languages, so holding one means the code was
/// validated. Equality and hashing consider all fields, which are fixed per code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Language {
    /// Short language code (e.g., "hi")
    code: &'static str,

    /// English display name (e.g., "Hindi")
    #[serde(rename = "display_name")]
    name: &'static str,

    /// Name in the language itself (e.g., "हिन्दी")
    native_name: &'static str,
}

impl Language {
    pub(crate) fn new(code: &'static str, name: &'static str, native_name: &'static str) -> Self {
        Self {
            code,
            name,
            native_name,
        }
    }

    /// Resolve a code or display name against the default catalog.
    pub fn from_code(code: &str) -> Result<Language> {
        LanguageCatalog::global().resolve(code)
    }

    /// The canonical language of the default catalog.
    pub fn canonical() -> Language {
        LanguageCatalog::global().canonical()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn native_name(&self) -> &'static str {
        self.native_name
    }

    /// Localized notification strings for this language.
    pub fn strings(&self) -> &'static LanguageStrings {
        LanguageStrings::for_code(self.code)
    }
}

/// Deserializes from the serialized form by resolving `code` against the
/// default catalog, so stored languages are validated again on load.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Stored {
            code: String,
        }

        let stored = Stored::deserialize(deserializer)?;
        Language::from_code(&stored.code).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_hindi() {
        let hindi = Language::from_code("hi").expect("Should succeed");
        assert_eq!(hindi.code(), "hi");
        assert_eq!(hindi.name(), "Hindi");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("fr");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_canonical_is_english() {
        assert_eq!(Language::canonical().code(), "en");
    }

    #[test]
    fn test_equality_across_lookups() {
        let a = Language::from_code("ta").unwrap();
        let b = Language::from_code("Tamil").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Language::canonical());
    }

    #[test]
    fn test_display() {
        let telugu = Language::from_code("te").unwrap();
        assert_eq!(telugu.to_string(), "Telugu (te)");
    }

    #[test]
    fn test_serializes_display_name() {
        let gujarati = Language::from_code("gu").unwrap();
        let json = serde_json::to_value(gujarati).expect("serialize");
        assert_eq!(json["code"], "gu");
        assert_eq!(json["display_name"], "Gujarati");
        assert_eq!(json["native_name"], "ગુજરાતી");
    }

    #[test]
    fn test_deserializes_by_code() {
        let json = r#"{"code":"pa","display_name":"anything","native_name":"x"}"#;
        let punjabi: Language = serde_json::from_str(json).expect("deserialize");
        assert_eq!(punjabi, Language::from_code("pa").unwrap());

        let unknown = serde_json::from_str::<Language>(r#"{"code":"fr"}"#);
        assert!(unknown.unwrap_err().to_string().contains("Unknown language"));
    }

    #[test]
    fn test_strings_lookup() {
        let marathi = Language::from_code("mr").unwrap();
        assert_eq!(marathi.strings().emergency_label, "आणीबाणी");
    }
}
