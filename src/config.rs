use crate::dispatch::DispatchOptions;
use crate::retry::{Backoff, RetryPolicy};
use crate::service::DEFAULT_MAX_RETRIES_LIMIT;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Which `TranslationProvider` the service runs with
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderKind {
    Simulated {
        /// Fixed seed for reproducible output; entropy when absent
        seed: Option<u64>,
        failure_rate: f64,
    },
    Remote {
        api_url: String,
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub api_key: Option<String>,

    // Translation
    pub provider: ProviderKind,

    // Retries
    pub max_retries: u32,
    /// Highest `max_retries` a request may ask for
    pub max_retries_limit: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub per_target_timeout_ms: u64,

    // Ledger journal; in-memory when unset
    pub ledger_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("TRANSLATION_PROVIDER")
            .unwrap_or_else(|_| "simulated".to_string())
            .to_lowercase()
            .as_str()
        {
            "simulated" => ProviderKind::Simulated {
                seed: parse_var("SIMULATION_SEED")?,
                failure_rate: parse_var("SIMULATION_FAILURE_RATE")?.unwrap_or(0.0),
            },
            "remote" => ProviderKind::Remote {
                api_url: std::env::var("TRANSLATION_API_URL")
                    .context("TRANSLATION_API_URL not set")?,
                api_key: non_empty_var("TRANSLATION_API_KEY"),
            },
            other => bail!(
                "TRANSLATION_PROVIDER must be 'simulated' or 'remote', got '{}'",
                other
            ),
        };

        let max_retries = parse_var("MAX_RETRIES")?.unwrap_or(2);
        let max_retries_limit =
            parse_var("MAX_RETRIES_LIMIT")?.unwrap_or(DEFAULT_MAX_RETRIES_LIMIT);
        if max_retries > max_retries_limit {
            bail!(
                "MAX_RETRIES ({}) exceeds MAX_RETRIES_LIMIT ({})",
                max_retries,
                max_retries_limit
            );
        }

        Ok(Self {
            // Server
            port: parse_var("PORT")?.unwrap_or(8080),
            api_key: non_empty_var("API_KEY"),

            provider,

            // Retries
            max_retries,
            max_retries_limit,
            retry_initial_delay_ms: parse_var("RETRY_INITIAL_DELAY_MS")?.unwrap_or(500),
            retry_max_delay_ms: parse_var("RETRY_MAX_DELAY_MS")?.unwrap_or(5_000),
            per_target_timeout_ms: parse_var("PER_TARGET_TIMEOUT_MS")?.unwrap_or(10_000),

            ledger_path: non_empty_var("LEDGER_PATH").map(PathBuf::from),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
        .with_backoff(Backoff::Exponential {
            initial: Duration::from_millis(self.retry_initial_delay_ms),
            multiplier: 2.0,
            max: Duration::from_millis(self.retry_max_delay_ms),
        })
    }

    /// Options every dispatch starts from before request overrides
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            retry: self.retry_policy(),
            per_target_timeout: Duration::from_millis(self.per_target_timeout_ms),
            ..DispatchOptions::default()
        }
    }
}

/// Unset or blank variables yield `None`
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable when set; a malformed value is an error rather than a silent default
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: '{}'", name, value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 13] = [
        "PORT",
        "API_KEY",
        "TRANSLATION_PROVIDER",
        "TRANSLATION_API_URL",
        "TRANSLATION_API_KEY",
        "SIMULATION_SEED",
        "SIMULATION_FAILURE_RATE",
        "MAX_RETRIES",
        "MAX_RETRIES_LIMIT",
        "RETRY_INITIAL_DELAY_MS",
        "RETRY_MAX_DELAY_MS",
        "PER_TARGET_TIMEOUT_MS",
        "LEDGER_PATH",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.api_key.is_none());
        assert_eq!(
            config.provider,
            ProviderKind::Simulated {
                seed: None,
                failure_rate: 0.0
            }
        );
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.max_retries_limit, 10);
        assert!(config.ledger_path.is_none());
    }

    #[test]
    #[serial]
    fn test_remote_provider() {
        clear_env();
        std::env::set_var("TRANSLATION_PROVIDER", "Remote");
        std::env::set_var("TRANSLATION_API_URL", "https://translate.example.com");
        std::env::set_var("TRANSLATION_API_KEY", "secret");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.provider,
            ProviderKind::Remote {
                api_url: "https://translate.example.com".to_string(),
                api_key: Some("secret".to_string()),
            }
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_remote_provider_requires_url() {
        clear_env();
        std::env::set_var("TRANSLATION_PROVIDER", "remote");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("TRANSLATION_API_URL"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_provider_rejected() {
        clear_env();
        std::env::set_var("TRANSLATION_PROVIDER", "carrier-pigeon");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_number_rejected() {
        clear_env();
        std::env::set_var("MAX_RETRIES", "lots");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("MAX_RETRIES"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_max_retries_above_limit_rejected() {
        clear_env();
        std::env::set_var("MAX_RETRIES", "6");
        std::env::set_var("MAX_RETRIES_LIMIT", "5");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("MAX_RETRIES_LIMIT"));

        std::env::set_var("MAX_RETRIES_LIMIT", "6");
        assert_eq!(Config::from_env().unwrap().max_retries_limit, 6);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_api_key_is_none() {
        clear_env();
        std::env::set_var("API_KEY", "  ");
        assert!(Config::from_env().unwrap().api_key.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_dispatch_options_from_env() {
        clear_env();
        std::env::set_var("MAX_RETRIES", "4");
        std::env::set_var("RETRY_INITIAL_DELAY_MS", "100");
        std::env::set_var("RETRY_MAX_DELAY_MS", "300");
        std::env::set_var("PER_TARGET_TIMEOUT_MS", "2500");
        std::env::set_var("SIMULATION_SEED", "7");

        let config = Config::from_env().unwrap();
        let options = config.dispatch_options();

        assert_eq!(options.retry.max_retries, 4);
        assert_eq!(options.retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(options.retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(options.retry.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(options.per_target_timeout, Duration::from_millis(2500));
        assert!(matches!(
            config.provider,
            ProviderKind::Simulated { seed: Some(7), .. }
        ));
        clear_env();
    }
}
