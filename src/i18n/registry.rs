//! Language catalog: single source of truth for supported languages.
//!
//! A process-wide default catalog is available through `LanguageCatalog::global()`
//! (initialized once with `OnceLock`). Custom catalogs can be built with
//! `LanguageCatalog::new`, which rejects duplicate codes. A catalog is immutable
//! after construction.

use crate::error::{DispatchError, Result};
use crate::i18n::Language;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Short language code (e.g., "hi", "ta")
    pub code: &'static str,

    /// English name of the language (e.g., "Hindi")
    pub name: &'static str,

    /// Native name of the language (e.g., "हिन्दी")
    pub native_name: &'static str,

    /// Whether this is the canonical language (fallback source)
    pub is_canonical: bool,

    /// Whether this language can be resolved and listed
    pub enabled: bool,
}

impl LanguageConfig {
    fn to_language(&self) -> Language {
        Language::new(self.code, self.name, self.native_name)
    }
}

/// Ordered registry of supported languages.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    languages: Vec<LanguageConfig>,
    canonical: usize,
}

/// Default catalog instance (initialized lazily)
static CATALOG: OnceLock<LanguageCatalog> = OnceLock::new();

impl LanguageCatalog {
    /// Get the default catalog shared by the whole process.
    pub fn global() -> &'static LanguageCatalog {
        CATALOG.get_or_init(|| LanguageCatalog {
            languages: default_languages(),
            canonical: 0,
        })
    }

    /// Build a catalog from an explicit list, preserving its order.
    ///
    /// The first entry flagged `is_canonical` becomes the canonical language;
    /// if none is flagged, the first entry is used.
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self> {
        if languages.is_empty() {
            return Err(DispatchError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for lang in &languages {
            if !seen.insert(lang.code.to_ascii_lowercase()) {
                return Err(DispatchError::DuplicateLanguage(lang.code.to_string()));
            }
        }

        let canonical = languages
            .iter()
            .position(|lang| lang.is_canonical)
            .unwrap_or(0);

        Ok(Self {
            languages,
            canonical,
        })
    }

    /// Get a language configuration by its exact code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Resolve an identifier to an enabled language.
    ///
    /// Accepts a code (case-insensitive) or an English display name, since the
    /// presentation layer works with display names.
    pub fn resolve(&self, identifier: &str) -> Result<Language> {
        let needle = identifier.trim();
        let found = self.languages.iter().find(|lang| {
            lang.code.eq_ignore_ascii_case(needle) || lang.name.eq_ignore_ascii_case(needle)
        });

        match found {
            Some(config) if config.enabled => Ok(config.to_language()),
            _ => Err(DispatchError::UnknownLanguage(identifier.to_string())),
        }
    }

    /// Resolve many identifiers, dropping repeats and keeping first-seen order.
    ///
    /// Fails on the first unknown identifier.
    pub fn resolve_all<I, S>(&self, identifiers: I) -> Result<Vec<Language>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved: Vec<Language> = Vec::new();
        for identifier in identifiers {
            let language = self.resolve(identifier.as_ref())?;
            if !resolved.contains(&language) {
                resolved.push(language);
            }
        }
        Ok(resolved)
    }

    /// All enabled languages in catalog order.
    pub fn list(&self) -> Vec<Language> {
        self.languages
            .iter()
            .filter(|lang| lang.enabled)
            .map(LanguageConfig::to_language)
            .collect()
    }

    /// The canonical language (English in the default catalog).
    pub fn canonical(&self) -> Language {
        self.languages[self.canonical].to_language()
    }

    /// Check if a code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        LanguageCatalog::global().clone()
    }
}

fn lang(code: &'static str, name: &'static str, native_name: &'static str) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
        is_canonical: code == "en",
        enabled: true,
    }
}

/// Languages offered by the platform, in display order.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        lang("en", "English", "English"),
        lang("hi", "Hindi", "हिन्दी"),
        lang("mr", "Marathi", "मराठी"),
        lang("ta", "Tamil", "தமிழ்"),
        lang("te", "Telugu", "తెలుగు"),
        lang("kn", "Kannada", "ಕನ್ನಡ"),
        lang("ml", "Malayalam", "മലയാളം"),
        lang("gu", "Gujarati", "ગુજરાતી"),
        lang("pa", "Punjabi", "ਪੰਜਾਬੀ"),
        lang("bn", "Bengali", "বাংলা"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_returns_singleton() {
        let catalog1 = LanguageCatalog::global();
        let catalog2 = LanguageCatalog::global();
        assert!(std::ptr::eq(catalog1, catalog2));
    }

    #[test]
    fn test_list_is_in_insertion_order() {
        let codes: Vec<_> = LanguageCatalog::global()
            .list()
            .iter()
            .map(|lang| lang.code())
            .collect();
        assert_eq!(
            codes,
            vec!["en", "hi", "mr", "ta", "te", "kn", "ml", "gu", "pa", "bn"]
        );
    }

    #[test]
    fn test_resolve_by_code() {
        let hindi = LanguageCatalog::global().resolve("hi").expect("Should resolve");
        assert_eq!(hindi.code(), "hi");
        assert_eq!(hindi.name(), "Hindi");
        assert_eq!(hindi.native_name(), "हिन्दी");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let tamil = LanguageCatalog::global().resolve("TA").expect("Should resolve");
        assert_eq!(tamil.code(), "ta");
    }

    #[test]
    fn test_resolve_by_display_name() {
        let bengali = LanguageCatalog::global()
            .resolve("Bengali")
            .expect("Should resolve");
        assert_eq!(bengali.code(), "bn");
    }

    #[test]
    fn test_resolve_unknown() {
        let err = LanguageCatalog::global().resolve("xx").unwrap_err();
        assert!(matches!(err, DispatchError::UnknownLanguage(ref code) if code == "xx"));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(LanguageCatalog::global().resolve("").is_err());
    }

    #[test]
    fn test_resolve_all_deduplicates() {
        let langs = LanguageCatalog::global()
            .resolve_all(["hi", "Hindi", "ta", "hi"])
            .expect("Should resolve");
        let codes: Vec<_> = langs.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["hi", "ta"]);
    }

    #[test]
    fn test_resolve_all_fails_on_unknown() {
        let result = LanguageCatalog::global().resolve_all(["hi", "zz"]);
        assert!(matches!(result, Err(DispatchError::UnknownLanguage(_))));
    }

    #[test]
    fn test_canonical_is_english() {
        assert_eq!(LanguageCatalog::global().canonical().code(), "en");
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = LanguageCatalog::new(vec![
            lang("en", "English", "English"),
            lang("EN", "English again", "English"),
        ]);
        assert!(matches!(result, Err(DispatchError::DuplicateLanguage(_))));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            LanguageCatalog::new(Vec::new()),
            Err(DispatchError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_new_without_canonical_uses_first() {
        let catalog = LanguageCatalog::new(vec![
            lang("ta", "Tamil", "தமிழ்"),
            lang("te", "Telugu", "తెలుగు"),
        ])
        .expect("Should build");
        assert_eq!(catalog.canonical().code(), "ta");
    }

    #[test]
    fn test_disabled_language_is_hidden() {
        let mut punjabi = lang("pa", "Punjabi", "ਪੰਜਾਬੀ");
        punjabi.enabled = false;
        let catalog =
            LanguageCatalog::new(vec![lang("en", "English", "English"), punjabi]).expect("Build");

        assert!(catalog.resolve("pa").is_err());
        assert!(!catalog.is_enabled("pa"));
        assert_eq!(catalog.list().len(), 1);
    }
}
