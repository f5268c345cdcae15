//! Retry decision with exponential backoff
//!
//! The hook is stateless: the retry number lives in the caller's context under
//! `attempt` (absent means 1; a value that is not a count stops retrying). Each call either schedules that retry, writing
//! `should_retry = true` and `retry_delay` (seconds) and advancing `attempt`,
//! or, once `attempt` exceeds `max_attempts`, writes `should_retry = false`
//! and hands the error back unchanged.
//!
//! Default backoff: 1s, 2s, 4s for three retries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::core_types::ErrorRecord;
use crate::error::{EngineError, EngineResult};
use crate::logging::{log_debug, log_warn};
use crate::recovery::{context_keys, RecoveryContext, RecoveryHook};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries scheduled before giving up
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Grow the delay by `backoff_multiplier` per retry; constant otherwise
    pub exponential_backoff: bool,
    /// Symbols this hook retries. Empty means only the predicate decides.
    #[serde(default)]
    pub retryable_symbols: BTreeSet<String>,
    /// Upper bound on any single delay
    #[serde(default)]
    pub max_delay: Option<Duration>,
    /// Add up to 10% random jitter to each delay
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            exponential_backoff: true,
            retryable_symbols: BTreeSet::new(),
            max_delay: None,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Replace the retryable symbol set.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if `max_attempts` is 0, or
    /// the multiplier is below 1 (or not finite) with exponential backoff on.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_attempts < 1 {
            return Err(EngineError::configuration_error(
                "Retry max_attempts must be at least 1",
            ));
        }
        if self.exponential_backoff
            && !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0)
        {
            return Err(EngineError::configuration_error(format!(
                "Retry backoff_multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if let Some(max_delay) = self.max_delay {
            if max_delay < self.initial_delay {
                return Err(EngineError::configuration_error(
                    "Retry max_delay must not be shorter than initial_delay",
                ));
            }
        }
        Ok(())
    }
}

type RetryPredicate = Arc<dyn Fn(&ErrorRecord) -> bool + Send + Sync>;

/// Stateless retry hook.
#[derive(Clone)]
pub struct RetryHook {
    config: RetryConfig,
    predicate: Option<RetryPredicate>,
}

impl fmt::Debug for RetryHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryHook")
            .field("config", &self.config)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

impl RetryHook {
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if `config` fails validation.
    pub fn new(config: RetryConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            predicate: None,
        })
    }

    /// Decide retryability for errors when `retryable_symbols` is empty.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ErrorRecord) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_delay.as_secs_f64();
        let mut delay_seconds = if self.config.exponential_backoff {
            let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
            initial * self.config.backoff_multiplier.powi(exponent)
        } else {
            initial
        };

        if let Some(max_delay) = self.config.max_delay {
            delay_seconds = delay_seconds.min(max_delay.as_secs_f64());
        }

        if self.config.jitter {
            // Up to 10% jitter
            delay_seconds *= 1.0 + fastrand::f64() * 0.1;
        }

        Duration::try_from_secs_f64(delay_seconds).unwrap_or(Duration::MAX)
    }

    /// Read the retry number from the context. Absent or null means 1, and
    /// 0 is read as 1. Integral floats and numeric strings are accepted.
    /// `None` means the slot holds something that is not a count.
    fn current_attempt(context: &RecoveryContext) -> Option<u64> {
        let attempt = match context.get(context_keys::ATTEMPT) {
            None | Some(Value::Null) => Some(1),
            Some(Value::Number(number)) => number.as_u64().or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
            Some(_) => None,
        };
        attempt.map(|attempt| attempt.max(1))
    }

    fn give_up(context: &mut RecoveryContext) {
        context.insert(context_keys::SHOULD_RETRY.into(), false.into());
        context.remove(context_keys::RETRY_DELAY);
    }
}

impl RecoveryHook for RetryHook {
    fn name(&self) -> String {
        "retry".to_string()
    }

    fn should_recover(&self, error: &ErrorRecord, _context: &RecoveryContext) -> bool {
        if self.config.retryable_symbols.contains(error.symbol()) {
            return true;
        }
        self.config.retryable_symbols.is_empty()
            && self.predicate.as_ref().is_some_and(|predicate| predicate(error))
    }

    fn recover(&self, error: ErrorRecord, context: &mut RecoveryContext) -> Option<ErrorRecord> {
        let Some(attempt) = Self::current_attempt(context) else {
            log_warn!(
                error_code = %error.error_code(),
                attempt = %context.get(context_keys::ATTEMPT).unwrap_or(&serde_json::Value::Null),
                "Unreadable retry attempt count, not retrying"
            );
            Self::give_up(context);
            return Some(error);
        };

        if attempt > u64::from(self.config.max_attempts) {
            Self::give_up(context);
            log_warn!(
                error_code = %error.error_code(),
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                "Retry attempts exhausted"
            );
            return Some(error);
        }

        let delay = self.calculate_delay(u32::try_from(attempt).unwrap_or(u32::MAX));
        context.insert(context_keys::SHOULD_RETRY.into(), true.into());
        context.insert(context_keys::RETRY_DELAY.into(), delay.as_secs_f64().into());
        context.insert(context_keys::ATTEMPT.into(), (attempt + 1).into());

        log_debug!(
            error_code = %error.error_code(),
            attempt = attempt,
            max_attempts = self.config.max_attempts,
            delay_ms = delay.as_millis(),
            "Retry scheduled"
        );
        None
    }
}
