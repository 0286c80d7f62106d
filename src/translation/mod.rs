//! Translation capability.
//!
//! `TranslationProvider` is the seam between the dispatcher and whatever
//! performs translation. Expected failures (empty text, unsupported pair,
//! upstream errors) are returned as `TranslationResult::Failure`, never as
//! `Err`, so the dispatcher can record and retry them per target.

mod detect;
mod remote;
mod simulated;

pub use detect::detect_script;
pub use remote::RemoteProvider;
pub use simulated::SimulatedProvider;

use crate::error::Result;
use crate::i18n::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One unit of translation work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: Language, target: Language) -> Self {
        Self {
            text: text.into(),
            source,
            target,
        }
    }

    /// Source and target are the same language
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

/// Outcome of a single translation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationResult {
    Success {
        translated_text: String,
    },
    Failure {
        reason: String,
        /// Transient failures are retried per policy; permanent ones are not
        retryable: bool,
    },
}

impl TranslationResult {
    pub fn success(translated_text: impl Into<String>) -> Self {
        TranslationResult::Success {
            translated_text: translated_text.into(),
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        TranslationResult::Failure {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        TranslationResult::Failure {
            reason: reason.into(),
            retryable: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TranslationResult::Failure { retryable: true, .. })
    }
}

/// Something that can translate text and detect its language.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Translate `request.text` from `request.source` to `request.target`.
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult;

    /// Detect the language of `text`.
    ///
    /// Fails with `DispatchError::DetectionFailed` when the text is empty or no
    /// supported language is recognized.
    async fn detect_language(&self, text: &str) -> Result<Language>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_request() {
        let hindi = Language::from_code("hi").unwrap();
        let tamil = Language::from_code("ta").unwrap();

        assert!(TranslationRequest::new("x", hindi, hindi).is_identity());
        assert!(!TranslationRequest::new("x", hindi, tamil).is_identity());
    }

    #[test]
    fn test_result_constructors() {
        assert!(TranslationResult::success("ok").is_success());
        assert!(TranslationResult::transient("timeout").is_retryable());
        assert!(!TranslationResult::permanent("bad pair").is_retryable());
        assert!(!TranslationResult::success("ok").is_retryable());
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(TranslationResult::permanent("bad pair")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "bad pair");
        assert_eq!(json["retryable"], false);
    }
}
