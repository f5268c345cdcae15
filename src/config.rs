use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::logging::log_debug;
use crate::recovery::{CircuitBreakerConfig, RetryConfig};

const ENV_PREFIX: &str = "RECOVERY_";

const RETRY_MAX_ATTEMPTS: &str = "retry_max_attempts";
const RETRY_INITIAL_DELAY_MS: &str = "retry_initial_delay_ms";
const RETRY_BACKOFF_MULTIPLIER: &str = "retry_backoff_multiplier";
const RETRY_EXPONENTIAL: &str = "retry_exponential";
const RETRY_MAX_DELAY_MS: &str = "retry_max_delay_ms";
const RETRY_JITTER: &str = "retry_jitter";
const RETRY_SYMBOLS: &str = "retry_symbols";
const CB_FAILURE_THRESHOLD: &str = "cb_failure_threshold";
const CB_SUCCESS_THRESHOLD: &str = "cb_success_threshold";
const CB_TIMEOUT_SECS: &str = "cb_timeout_secs";

const RETRY_KEYS: [&str; 7] = [
    RETRY_MAX_ATTEMPTS,
    RETRY_INITIAL_DELAY_MS,
    RETRY_BACKOFF_MULTIPLIER,
    RETRY_EXPONENTIAL,
    RETRY_MAX_DELAY_MS,
    RETRY_JITTER,
    RETRY_SYMBOLS,
];
const CB_KEYS: [&str; 3] = [CB_FAILURE_THRESHOLD, CB_SUCCESS_THRESHOLD, CB_TIMEOUT_SECS];

/// Which recovery hooks a deployment enables, and how they are tuned.
///
/// A `None` section means the hook is not registered by
/// [`ErrorRecoveryManager::from_config`](crate::ErrorRecoveryManager::from_config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl RecoveryConfig {
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if an enabled section is invalid.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(circuit_breaker) = &self.circuit_breaker {
            circuit_breaker.validate()?;
        }
        Ok(())
    }

    /// Load configuration from `RECOVERY_*` environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// A section is enabled when any of its variables is set; unset fields
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if:
    /// - A variable is set but cannot be parsed
    /// - The resulting configuration fails validation
    pub fn from_env() -> EngineResult<Self> {
        let section: HashMap<String, String> = RETRY_KEYS
            .iter()
            .chain(CB_KEYS.iter())
            .filter_map(|key| {
                let var = format!("{ENV_PREFIX}{}", key.to_uppercase());
                std::env::var(&var).ok().map(|value| (key.to_string(), value))
            })
            .collect();

        log_debug!(
            variables_set = section.len(),
            "Loading recovery configuration from environment"
        );

        Self::from_section(&section)
    }

    /// Create configuration from parsed section data
    ///
    /// Keys are the lower-case variable names without the `RECOVERY_` prefix
    /// (`retry_max_attempts`, `cb_timeout_secs`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if:
    /// - A value cannot be parsed
    /// - The resulting configuration fails validation
    pub fn from_section(section: &HashMap<String, String>) -> EngineResult<Self> {
        let config = Self {
            retry: Self::retry_from_section(section)?,
            circuit_breaker: Self::circuit_breaker_from_section(section)?,
        };
        config.validate()?;

        log_debug!(
            retry_enabled = config.retry.is_some(),
            circuit_breaker_enabled = config.circuit_breaker.is_some(),
            "Recovery configuration loaded and validated"
        );
        Ok(config)
    }

    fn retry_from_section(section: &HashMap<String, String>) -> EngineResult<Option<RetryConfig>> {
        if !RETRY_KEYS.iter().any(|key| section.contains_key(*key)) {
            return Ok(None);
        }

        let mut retry = RetryConfig::default();
        if let Some(max_attempts) = Self::parse_param::<u32>(section, RETRY_MAX_ATTEMPTS)? {
            retry.max_attempts = max_attempts;
        }
        if let Some(delay_ms) = Self::parse_param::<u64>(section, RETRY_INITIAL_DELAY_MS)? {
            retry.initial_delay = Duration::from_millis(delay_ms);
        }
        if let Some(multiplier) = Self::parse_param::<f64>(section, RETRY_BACKOFF_MULTIPLIER)? {
            retry.backoff_multiplier = multiplier;
        }
        if let Some(exponential) = Self::parse_param::<bool>(section, RETRY_EXPONENTIAL)? {
            retry.exponential_backoff = exponential;
        }
        if let Some(max_delay_ms) = Self::parse_param::<u64>(section, RETRY_MAX_DELAY_MS)? {
            retry.max_delay = Some(Duration::from_millis(max_delay_ms));
        }
        if let Some(jitter) = Self::parse_param::<bool>(section, RETRY_JITTER)? {
            retry.jitter = jitter;
        }
        if let Some(symbols) = section.get(RETRY_SYMBOLS) {
            retry.retryable_symbols = symbols
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(Some(retry))
    }

    fn circuit_breaker_from_section(
        section: &HashMap<String, String>,
    ) -> EngineResult<Option<CircuitBreakerConfig>> {
        if !CB_KEYS.iter().any(|key| section.contains_key(*key)) {
            return Ok(None);
        }

        let mut circuit_breaker = CircuitBreakerConfig::default();
        if let Some(threshold) = Self::parse_param::<u32>(section, CB_FAILURE_THRESHOLD)? {
            circuit_breaker.failure_threshold = threshold;
        }
        if let Some(threshold) = Self::parse_param::<u32>(section, CB_SUCCESS_THRESHOLD)? {
            circuit_breaker.success_threshold = threshold;
        }
        if let Some(timeout) = Self::parse_param::<u64>(section, CB_TIMEOUT_SECS)? {
            circuit_breaker.timeout = Duration::from_secs(timeout);
        }
        Ok(Some(circuit_breaker))
    }

    /// Parse a parameter from the section HashMap
    fn parse_param<T: FromStr>(section: &HashMap<String, String>, key: &str) -> EngineResult<Option<T>> {
        section
            .get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|_| {
                    EngineError::configuration_error(format!("Invalid value for {key}: '{raw}'"))
                })
            })
            .transpose()
    }
}
