use thiserror::Error;

/// Errors surfaced by the dispatch core.
///
/// Only the validation variants (`UnknownLanguage`, `EmptyMessage`,
/// `NoTargets`) are returned from `dispatch` itself. Per-target failures are
/// captured in the report instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown language: '{0}'")]
    UnknownLanguage(String),

    #[error("Duplicate language code in catalog: '{0}'")]
    DuplicateLanguage(String),

    #[error("Language catalog must contain at least one language")]
    EmptyCatalog,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("At least one target language is required")]
    NoTargets,

    #[error("Language detection failed: {0}")]
    DetectionFailed(String),

    #[error("Invalid delivery transition: {0}")]
    InvalidTransition(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Ledger I/O error: {0}")]
    Ledger(#[from] std::io::Error),

    #[error("Ledger JSON error: {0}")]
    LedgerFormat(#[from] serde_json::Error),
}

impl DispatchError {
    /// Stable machine-readable code used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnknownLanguage(_) => "unknown_language",
            DispatchError::DuplicateLanguage(_) => "duplicate_language",
            DispatchError::EmptyCatalog => "empty_catalog",
            DispatchError::EmptyMessage => "empty_message",
            DispatchError::NoTargets => "no_targets",
            DispatchError::DetectionFailed(_) => "detection_failed",
            DispatchError::InvalidTransition(_) => "invalid_transition",
            DispatchError::JobNotFound(_) => "job_not_found",
            DispatchError::Ledger(_) | DispatchError::LedgerFormat(_) => "ledger_error",
        }
    }

    /// Whether the error is caused by caller input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownLanguage(_)
                | DispatchError::EmptyMessage
                | DispatchError::NoTargets
        )
    }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
