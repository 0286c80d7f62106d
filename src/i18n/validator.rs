//! Translation quality validation module.
//!
//! Emergency notifications carry details that must survive translation
//! verbatim: phone numbers, counts, URLs and e-mail addresses. The validator
//! compares the original message against a translation and reports anything
//! that went missing.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Critical errors that indicate translation issues
    pub errors: Vec<String>,

    /// Non-critical warnings about potential issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate that a translation preserves the critical details of the original.
    ///
    /// Missing numbers are errors (a wrong phone number is worse than no
    /// translation); missing URLs and e-mail addresses are warnings. An empty
    /// translation of a non-empty original is an error.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if translated.trim().is_empty() && !original.trim().is_empty() {
            report.errors.push("Translation is empty".to_string());
            return report;
        }

        let trans_numbers = Self::extract_numbers(translated);
        let missing_numbers: Vec<_> = Self::extract_numbers(original)
            .into_iter()
            .filter(|n| !trans_numbers.contains(n))
            .collect();
        if !missing_numbers.is_empty() {
            report.errors.push(format!(
                "Numbers missing from translation: {:?}",
                missing_numbers
            ));
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls.iter().any(|u| !trans_urls.contains(u)) {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        let orig_emails = Self::extract_emails(original);
        let trans_emails = Self::extract_emails(translated);
        if orig_emails.iter().any(|e| !trans_emails.contains(e)) {
            report.warnings.push(format!(
                "E-mail mismatch: original has {:?}, translation has {:?}",
                orig_emails, trans_emails
            ));
        }

        report
    }

    /// Extract digit runs, ignoring separators inside phone numbers ("112", "1800-180-1551")
    fn extract_numbers(text: &str) -> Vec<String> {
        let regex =
            NUMBER_REGEX.get_or_init(|| Regex::new(r"[0-9](?:[0-9\- ]*[0-9])?").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().chars().filter(|c| c.is_ascii_digit()).collect())
            .collect()
    }

    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn extract_emails(text: &str) -> Vec<String> {
        let regex = EMAIL_REGEX
            .get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Extraction Tests ====================

    #[test]
    fn test_extract_numbers_single() {
        let numbers = TranslationValidator::extract_numbers("Call 112 now");
        assert_eq!(numbers, vec!["112"]);
    }

    #[test]
    fn test_extract_numbers_phone_with_separators() {
        let numbers = TranslationValidator::extract_numbers("Helpline 1800-180-1551 open");
        assert_eq!(numbers, vec!["18001801551"]);
    }

    #[test]
    fn test_extract_numbers_none() {
        assert!(TranslationValidator::extract_numbers("No digits here").is_empty());
    }

    #[test]
    fn test_extract_urls_single() {
        let urls = TranslationValidator::extract_urls("Details at https://ndma.gov.in now");
        assert_eq!(urls, vec!["https://ndma.gov.in"]);
    }

    #[test]
    fn test_extract_emails() {
        let emails = TranslationValidator::extract_emails("Write to help@relief.org today");
        assert_eq!(emails, vec!["help@relief.org"]);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_preserved_details() {
        let original = "Flood warning. Call 112 or visit https://ndma.gov.in";
        let translated = "बाढ़ की चेतावनी। 112 पर कॉल करें या https://ndma.gov.in देखें";

        let report = TranslationValidator::validate(original, translated);
        assert!(report.is_clean());
    }

    #[test]
    fn test_validate_missing_number_is_error() {
        let original = "Call 112 immediately";
        let translated = "तुरंत कॉल करें";

        let report = TranslationValidator::validate(original, translated);
        assert!(report.has_errors());
        assert!(report.errors[0].contains("112"));
    }

    #[test]
    fn test_validate_missing_url_is_warning() {
        let original = "Read more at https://example.com";
        let translated = "और पढ़ें";

        let report = TranslationValidator::validate(original, translated);
        assert!(!report.has_errors());
        assert!(report.warnings[0].contains("URL mismatch"));
    }

    #[test]
    fn test_validate_empty_translation() {
        let report = TranslationValidator::validate("Evacuate", "   ");
        assert!(report.has_errors());
        assert_eq!(report.errors[0], "Translation is empty");
    }

    #[test]
    fn test_validation_report_new() {
        let report = ValidationReport::new();
        assert!(report.is_clean());
        assert!(!report.has_errors());
        assert!(!report.has_warnings());
    }
}
