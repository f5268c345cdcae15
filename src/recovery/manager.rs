//! Ordered hook chain driving one recovery attempt.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use structured_recovery::{external_error, ErrorRecoveryManager, FallbackHook, RecoveryContext};
//!
//! # fn main() -> structured_recovery::EngineResult<()> {
//! let mut manager = ErrorRecoveryManager::new();
//! manager.add_fallback_hook(FallbackHook::with_value(json!({"default": "data"}), ["data_fetch_failed"]));
//!
//! let error = external_error("data_fetch_failed", "Upstream returned 503")?;
//! let outcome = manager.attempt_recovery(error, RecoveryContext::new());
//!
//! assert!(outcome.recovered);
//! assert_eq!(outcome.context["fallback_result"], json!({"default": "data"}));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::RecoveryConfig;
use crate::core_types::ErrorRecord;
use crate::error::EngineResult;
use crate::logging::{log_debug, log_warn};
use crate::recovery::{
    context_keys, CircuitBreakerConfig, CircuitBreakerHook, CustomHook, FallbackHook,
    RecoveryContext, RecoveryHook, RetryConfig, RetryHook,
};

/// Verdict of one [`ErrorRecoveryManager::attempt_recovery`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryOutcome {
    /// A hook neutralized the error.
    pub recovered: bool,
    /// The error as the last hook left it; `None` when recovered.
    pub remaining_error: Option<ErrorRecord>,
    /// The context after every hook that ran.
    pub context: RecoveryContext,
}

impl RecoveryOutcome {
    /// `(recovered, remaining_error, context)`
    pub fn into_parts(self) -> (bool, Option<ErrorRecord>, RecoveryContext) {
        (self.recovered, self.remaining_error, self.context)
    }
}

/// Owns an ordered list of hooks and consults them in registration order.
///
/// Holds no state of its own beyond the list; hook-internal state (circuit
/// breaker counters) lives in the hooks.
#[derive(Clone, Default)]
pub struct ErrorRecoveryManager {
    hooks: Vec<Arc<dyn RecoveryHook>>,
}

impl std::fmt::Debug for ErrorRecoveryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRecoveryManager")
            .field("hooks", &self.hook_names())
            .finish()
    }
}

impl ErrorRecoveryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the hooks a [`RecoveryConfig`] enables: retry first, then
    /// the circuit breaker.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`](crate::EngineError::ConfigurationError)
    /// if either hook config is invalid.
    pub fn from_config(config: &RecoveryConfig) -> EngineResult<Self> {
        let mut manager = Self::new();
        if let Some(retry) = &config.retry {
            manager.add_retry_hook(retry.clone())?;
        }
        if let Some(circuit_breaker) = &config.circuit_breaker {
            manager.add_circuit_breaker_hook(circuit_breaker.clone())?;
        }
        Ok(manager)
    }

    /// Append a hook.
    pub fn add_hook(&mut self, hook: impl RecoveryHook + 'static) -> &mut Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Append a hook that is also held elsewhere.
    pub fn add_shared_hook(&mut self, hook: Arc<dyn RecoveryHook>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn add_retry_hook(&mut self, config: RetryConfig) -> EngineResult<&mut Self> {
        Ok(self.add_hook(RetryHook::new(config)?))
    }

    pub fn add_fallback_hook(&mut self, hook: FallbackHook) -> &mut Self {
        self.add_hook(hook)
    }

    /// Register a circuit breaker and return a handle for
    /// `check_before_execution` / `record_success` calls.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn add_circuit_breaker_hook(
        &mut self,
        config: CircuitBreakerConfig,
    ) -> EngineResult<Arc<CircuitBreakerHook>> {
        let hook = Arc::new(CircuitBreakerHook::new(config)?);
        self.hooks.push(hook.clone());
        Ok(hook)
    }

    pub fn add_custom_hook(&mut self, hook: CustomHook) -> &mut Self {
        self.add_hook(hook)
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn hook_names(&self) -> Vec<String> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    /// Run the hook chain for one failure.
    ///
    /// Hooks whose `should_recover` is true are asked to `recover` in
    /// registration order. The first one returning `None` ends the chain with
    /// `recovered = true`; a returned record replaces the working error for
    /// the hooks after it. If nobody recovers, the final error comes back
    /// with `recovered = false`.
    pub fn attempt_recovery(&self, error: ErrorRecord, mut context: RecoveryContext) -> RecoveryOutcome {
        let mut current = error;

        for hook in &self.hooks {
            if !hook.should_recover(&current, &context) {
                continue;
            }

            let name = hook.name();
            log_debug!(
                hook = %name,
                error_code = %current.error_code(),
                "Attempting recovery"
            );

            match hook.recover(current, &mut context) {
                None => {
                    log_debug!(hook = %name, "Error recovered");
                    context.insert(context_keys::RECOVERED_BY.into(), name.into());
                    return RecoveryOutcome {
                        recovered: true,
                        remaining_error: None,
                        context,
                    };
                }
                Some(next) => current = next,
            }
        }

        log_warn!(
            error_code = %current.error_code(),
            hooks = self.hooks.len(),
            "Error not recovered"
        );
        RecoveryOutcome {
            recovered: false,
            remaining_error: Some(current),
            context,
        }
    }
}
