//! Exponential reconnection backoff for the worker loops.

use std::time::Duration;

use crate::config::BackoffSettings;

/// Delay schedule between failed connection attempts.
///
/// The delay grows as `initial * multiplier^attempt` and is capped at `max`.
/// There is no attempt limit: the workers keep reconnecting until the engine
/// stops, logging a warning every `warn_after` consecutive failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    warn_after: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_settings(&BackoffSettings::default())
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64, warn_after: u32) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: if multiplier.is_finite() {
                multiplier.max(1.0)
            } else {
                1.0
            },
            warn_after,
        }
    }

    pub fn from_settings(settings: &BackoffSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.initial_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
            settings.multiplier,
            settings.warn_after,
        )
    }

    /// Delay to wait after the `attempt`-th consecutive failure (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let millis = self.initial.as_millis() as f64 * self.multiplier.powi(exp);
        if !millis.is_finite() || millis >= self.max.as_millis() as f64 {
            return self.max;
        }
        Duration::from_millis(millis as u64)
    }

    /// Whether the `failures`-th consecutive failure should be logged as a warning.
    pub fn should_warn(&self, failures: u32) -> bool {
        self.warn_after > 0 && failures > 0 && failures % self.warn_after == 0
    }
}
