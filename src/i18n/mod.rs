//! Internationalization (i18n) module for multi-language support.
//!
//! # Architecture
//!
//! - `registry`: the `LanguageCatalog`, single source of truth for supported languages
//! - `language`: validated `Language` values handed out by a catalog
//! - `strings`: localized labels for urgent notifications and fallbacks
//! - `validator`: checks that numbers and links survive translation
//! - `metrics`: dispatch counters
//!
//! # Example
//!
//! ```rust,ignore
//! use lingua_dispatch::i18n::LanguageCatalog;
//!
//! let catalog = LanguageCatalog::global();
//! let hindi = catalog.resolve("hi")?;
//! let all = catalog.list();
//! ```

mod language;
mod metrics;
mod registry;
mod strings;
mod validator;

pub use language::Language;
pub use metrics::{DispatchMetrics, MetricsReport};
pub use registry::{LanguageCatalog, LanguageConfig};
pub use strings::LanguageStrings;
pub use validator::{TranslationValidator, ValidationReport};
