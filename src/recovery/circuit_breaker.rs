//! Circuit breaker hook: a per-identifier CLOSED/OPEN/HALF_OPEN health gate.
//!
//! One state record is kept per `circuit_breaker_id` for the lifetime of the
//! hook. State lives in a sharded concurrent map, so calls for one identifier
//! are serialized against each other while unrelated identifiers proceed in
//! parallel.
//!
//! Transitions:
//! - CLOSED: each failure counts; reaching `failure_threshold` opens the circuit.
//!   A success clears the failure streak.
//! - OPEN: requests are refused until `timeout` has passed since opening; the
//!   first check after that moves to HALF_OPEN and lets the probe through.
//! - HALF_OPEN: probes pass. `success_threshold` successes close the circuit;
//!   any failure reopens it with a fresh timeout.
//!
//! The hook never suppresses an error. `recover` records the failure and hands
//! the error back; gating happens through [`CircuitBreakerHook::check_before_execution`].

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::core_types::ErrorRecord;
use crate::error::{EngineError, EngineResult};
use crate::logging::{log_debug, log_info, log_warn};
use crate::recovery::{context_keys, RecoveryContext, RecoveryHook};

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in CLOSED before the circuit opens
    pub failure_threshold: u32,
    /// Successful probes in HALF_OPEN before the circuit closes
    pub success_threshold: u32,
    /// How long the circuit stays OPEN before probing
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if either threshold is 0.
    pub fn validate(&self) -> EngineResult<()> {
        if self.failure_threshold < 1 {
            return Err(EngineError::configuration_error(
                "Circuit breaker failure_threshold must be at least 1",
            ));
        }
        if self.success_threshold < 1 {
            return Err(EngineError::configuration_error(
                "Circuit breaker success_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation
    #[default]
    Closed,
    /// Failing, blocking requests
    Open,
    /// Testing if the dependency recovered
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health record for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitBreakerState {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub opened_at: Option<Instant>,
}

/// Recovery hook tracking dependency health per identifier.
#[derive(Debug)]
pub struct CircuitBreakerHook {
    config: CircuitBreakerConfig,
    states: DashMap<String, CircuitBreakerState>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreakerHook {
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if `config` fails validation.
    pub fn new(config: CircuitBreakerConfig) -> EngineResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`new`](Self::new) with an injected time source.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            states: DashMap::new(),
            clock,
        })
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Whether a call for `id` may proceed.
    ///
    /// An OPEN circuit whose timeout has elapsed moves to HALF_OPEN here and
    /// admits the probe. Concurrent callers racing on that transition may all
    /// be admitted; a failing probe reopens the circuit.
    pub fn check_before_execution(&self, id: &str) -> bool {
        let Some(mut entry) = self.states.get_mut(id) else {
            return true;
        };

        let current = entry.state;
        match current {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let Some(opened_at) = entry.opened_at else {
                    return false;
                };
                if self.clock.now().saturating_duration_since(opened_at) >= self.config.timeout {
                    entry.state = CircuitState::HalfOpen;
                    entry.success_count = 0;
                    log_info!(
                        circuit_breaker_id = %id,
                        timeout_seconds = self.config.timeout.as_secs(),
                        "Circuit breaker half-open, probing dependency"
                    );
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call for `id`.
    pub fn record_success(&self, id: &str) -> CircuitState {
        let Some(mut entry) = self.states.get_mut(id) else {
            return CircuitState::Closed;
        };

        let current = entry.state;
        match current {
            CircuitState::HalfOpen => {
                entry.success_count = entry.success_count.saturating_add(1);
                if entry.success_count >= self.config.success_threshold {
                    log_info!(
                        circuit_breaker_id = %id,
                        success_count = entry.success_count,
                        "Circuit breaker recovered, returning to closed state"
                    );
                    *entry = CircuitBreakerState::default();
                }
            }
            CircuitState::Closed => {
                entry.failure_count = 0;
            }
            CircuitState::Open => {
                log_debug!(
                    circuit_breaker_id = %id,
                    "Success recorded while circuit open; waiting for timeout"
                );
            }
        }
        entry.state
    }

    /// Record a failed call for `id`.
    pub fn record_failure(&self, id: &str) -> CircuitState {
        let now = self.clock.now();
        let mut entry = self.states.entry(id.to_string()).or_default();

        let current = entry.state;
        match current {
            CircuitState::Closed => {
                entry.failure_count = entry.failure_count.saturating_add(1);
                if entry.failure_count >= self.config.failure_threshold {
                    entry.state = CircuitState::Open;
                    entry.opened_at = Some(now);
                    entry.success_count = 0;
                    log_warn!(
                        circuit_breaker_id = %id,
                        failure_count = entry.failure_count,
                        failure_threshold = self.config.failure_threshold,
                        timeout_seconds = self.config.timeout.as_secs(),
                        "Circuit breaker opened due to repeated failures"
                    );
                }
            }
            CircuitState::HalfOpen => {
                entry.failure_count = entry.failure_count.saturating_add(1);
                entry.state = CircuitState::Open;
                entry.opened_at = Some(now);
                entry.success_count = 0;
                log_warn!(
                    circuit_breaker_id = %id,
                    "Circuit breaker probe failed, reopening"
                );
            }
            CircuitState::Open => {
                // Already open; keep the original opened_at so probing is not postponed
                entry.failure_count = entry.failure_count.saturating_add(1);
            }
        }
        entry.state
    }

    /// Current state for `id`; unknown identifiers are CLOSED.
    pub fn state(&self, id: &str) -> CircuitState {
        self.states
            .get(id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Copy of the full health record for `id`, if any call has been recorded.
    pub fn snapshot(&self, id: &str) -> Option<CircuitBreakerState> {
        self.states.get(id).map(|entry| entry.clone())
    }

    /// Install a health record for `id`, typically one taken with
    /// [`snapshot`](Self::snapshot) from another breaker.
    pub fn restore(&self, id: impl Into<String>, state: CircuitBreakerState) {
        let id = id.into();
        log_debug!(circuit_breaker_id = %id, state = ?state.state, "Circuit breaker state restored");
        self.states.insert(id, state);
    }

    /// Forget everything recorded for `id`.
    pub fn reset(&self, id: &str) {
        if self.states.remove(id).is_some() {
            log_debug!(circuit_breaker_id = %id, "Circuit breaker reset");
        }
    }

    /// Identifiers with recorded state.
    pub fn ids(&self) -> Vec<String> {
        self.states.iter().map(|entry| entry.key().clone()).collect()
    }

    fn breaker_id(context: &RecoveryContext) -> Option<&str> {
        context
            .get(context_keys::CIRCUIT_BREAKER_ID)
            .and_then(serde_json::Value::as_str)
    }
}

impl RecoveryHook for CircuitBreakerHook {
    fn name(&self) -> String {
        "circuit_breaker".to_string()
    }

    fn should_recover(&self, _error: &ErrorRecord, context: &RecoveryContext) -> bool {
        Self::breaker_id(context).is_some()
    }

    fn recover(&self, error: ErrorRecord, context: &mut RecoveryContext) -> Option<ErrorRecord> {
        let Some(id) = Self::breaker_id(context).map(str::to_string) else {
            log_debug!(
                error_code = %error.error_code(),
                "No circuit_breaker_id in context; failure not recorded"
            );
            return Some(error);
        };

        let state = self.record_failure(&id);
        context.insert(context_keys::CIRCUIT_STATE.into(), state.as_str().into());
        Some(error)
    }
}
