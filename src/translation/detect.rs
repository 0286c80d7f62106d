//! Script-based language detection.
//!
//! Counts characters per Unicode script and picks the dominant one. Devanagari
//! is shared by Hindi and Marathi; text containing the letter ळ is treated as
//! Marathi, anything else as Hindi.

use crate::error::{DispatchError, Result};
use crate::i18n::{Language, LanguageCatalog};
use regex::Regex;
use std::sync::OnceLock;

static SCRIPTS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();

fn scripts() -> &'static [(&'static str, Regex)] {
    SCRIPTS.get_or_init(|| {
        [
            ("hi", r"\p{Devanagari}"),
            ("ta", r"\p{Tamil}"),
            ("te", r"\p{Telugu}"),
            ("kn", r"\p{Kannada}"),
            ("ml", r"\p{Malayalam}"),
            ("gu", r"\p{Gujarati}"),
            ("pa", r"\p{Gurmukhi}"),
            ("bn", r"\p{Bengali}"),
            ("en", r"\p{Latin}"),
        ]
        .into_iter()
        .map(|(code, pattern)| (code, Regex::new(pattern).unwrap()))
        .collect()
    })
}

/// Detect the language of `text` and resolve it in `catalog`.
pub fn detect_script(text: &str, catalog: &LanguageCatalog) -> Result<Language> {
    if text.trim().is_empty() {
        return Err(DispatchError::DetectionFailed("text is empty".to_string()));
    }

    let mut best: Option<(&str, usize)> = None;
    for (code, regex) in scripts() {
        let count = regex.find_iter(text).count();
        if count > best.map(|(_, c)| c).unwrap_or(0) {
            best = Some((code, count));
        }
    }

    let code = match best {
        Some(("hi", _)) if text.contains('ळ') => "mr",
        Some((code, _)) => code,
        None => {
            return Err(DispatchError::DetectionFailed(
                "no recognizable script".to_string(),
            ))
        }
    };

    catalog.resolve(code).map_err(|_| {
        DispatchError::DetectionFailed(format!("detected '{}' is not in the catalog", code))
    })
}
