pub mod config;
pub mod dispatch;
pub mod error;
pub mod i18n;
pub mod ledger;
pub mod retry;
pub mod security;
pub mod server;
pub mod service;
pub mod translation;

use config::{Config, ProviderKind};
use dispatch::NotificationDispatcher;
use i18n::LanguageCatalog;
use ledger::DeliveryLedger;
use service::NotificationService;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use translation::{RemoteProvider, SimulatedProvider, TranslationProvider};

/// Build the translation provider selected by the configuration
pub fn build_provider(config: &Config, catalog: Arc<LanguageCatalog>) -> Arc<dyn TranslationProvider> {
    match &config.provider {
        ProviderKind::Simulated { seed, failure_rate } => {
            let provider = match seed {
                Some(seed) => SimulatedProvider::new(*seed),
                None => SimulatedProvider::from_entropy(),
            };
            Arc::new(
                provider
                    .with_catalog(catalog)
                    .with_failure_rate(*failure_rate),
            )
        }
        ProviderKind::Remote { api_url, api_key } => {
            let provider = RemoteProvider::new(api_url.clone(), api_key.clone()).with_catalog(catalog);
            // Requests never outlive the per-target timeout
            let client = reqwest::Client::builder()
                .timeout(Duration::from_millis(config.per_target_timeout_ms))
                .build();
            match client {
                Ok(client) => Arc::new(provider.with_client(client)),
                Err(e) => {
                    warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                    Arc::new(provider)
                }
            }
        }
    }
}

/// Wire catalog, provider and ledger into a ready service.
///
/// Jobs journaled by an earlier process are restored so they can be looked
/// up and resumed.
pub fn build_service(config: &Config) -> error::Result<NotificationService> {
    let catalog = Arc::new(LanguageCatalog::global().clone());
    let provider = build_provider(config, catalog.clone());
    let ledger = match &config.ledger_path {
        Some(path) => DeliveryLedger::with_journal(path)?,
        None => DeliveryLedger::in_memory(),
    };

    let dispatcher = NotificationDispatcher::new(catalog, provider, Arc::new(ledger));
    let service = NotificationService::new(dispatcher, config.dispatch_options())
        .with_max_retries_limit(config.max_retries_limit);
    service.restore();
    Ok(service)
}
