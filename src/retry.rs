use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait between attempts of the same target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Wait the same delay before every retry
    Fixed {
        #[serde(with = "millis")]
        delay: Duration,
    },
    /// Multiply the delay after each retry, capped at `max`
    Exponential {
        #[serde(with = "millis")]
        initial: Duration,
        multiplier: f64,
        #[serde(with = "millis")]
        max: Duration,
    },
}

/// Retry behavior for a single target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 means a single attempt)
    pub max_retries: u32,
    /// Delay strategy between attempts
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Create a new policy with exponential backoff (multiplier 2, capped at 30s)
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                initial: initial_delay,
                multiplier: 2.0,
                max: Duration::from_secs(30),
            },
        }
    }

    /// Replace the backoff strategy
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Preset: no retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Preset: standard retries for translation calls (2 retries)
    /// Delays: 500ms, 1s = 1.5s total wait time
    pub fn translation() -> Self {
        Self::new(2, Duration::from_millis(500)).with_backoff(Backoff::Exponential {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max: Duration::from_secs(5),
        })
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate the delay before a given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self.backoff {
            Backoff::Fixed { delay } => delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let delay_ms =
                    initial.as_millis() as f64 * multiplier.powi((attempt - 1) as i32);
                Duration::from_millis(delay_ms as u64).min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::translation()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
