use super::{detect_script, TranslationProvider, TranslationRequest, TranslationResult};
use crate::error::Result;
use crate::i18n::{Language, LanguageCatalog};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Provider that picks one of a few canned renderings at random.
///
/// Seeded construction makes the sequence of outputs reproducible. An optional
/// failure rate injects transient failures drawn from the same generator.
pub struct SimulatedProvider {
    catalog: Arc<LanguageCatalog>,
    rng: Mutex<StdRng>,
    failure_rate: f64,
}

impl SimulatedProvider {
    /// Create a provider with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            catalog: Arc::new(LanguageCatalog::global().clone()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            failure_rate: 0.0,
        }
    }

    /// Create a provider seeded from system entropy
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Resolve detected languages against a specific catalog
    pub fn with_catalog(mut self, catalog: Arc<LanguageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Fail this fraction of calls (0.0 to 1.0) with a transient error
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn render(choice: usize, request: &TranslationRequest) -> String {
        match choice {
            0 => format!(
                "Translated text from {} to {}: {}",
                request.source.name(),
                request.target.name(),
                request.text
            ),
            1 => format!("Another possible translation: {} (simulated)", request.text),
            _ => format!("Machine translation: {}", request.text),
        }
    }
}

#[async_trait]
impl TranslationProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.text.trim().is_empty() {
            return TranslationResult::permanent("text is empty");
        }

        let (fails, choice) = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let fails = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
            (fails, rng.gen_range(0..3))
        };

        if fails {
            return TranslationResult::transient(format!(
                "simulated outage translating to {}",
                request.target.name()
            ));
        }

        TranslationResult::success(Self::render(choice, request))
    }

    async fn detect_language(&self, text: &str) -> Result<Language> {
        detect_script(text, &self.catalog)
    }
}
