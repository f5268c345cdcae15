//! Recovery hooks and the manager that chains them
//!
//! A [`RecoveryHook`] decides whether it applies to an error
//! ([`should_recover`](RecoveryHook::should_recover)) and then tries to
//! neutralize it ([`recover`](RecoveryHook::recover)). Returning `None` means
//! the failure is handled; returning a record passes it, possibly enriched, to
//! the next hook.
//!
//! Hooks never sleep or block. The retry hook only *decides* (writing
//! `should_retry` and `retry_delay` into the context); waiting and re-running
//! the operation belongs to the caller.
//!
//! ## Organization
//! - `retry` - Stateless retry decision with exponential backoff
//! - `fallback` - Substitute result from a static value or a function
//! - `circuit_breaker` - Per-identifier CLOSED/OPEN/HALF_OPEN health gate
//! - `custom` - Closure-backed hooks
//! - `manager` - Ordered hook chain driving one recovery attempt

pub mod circuit_breaker;
pub mod custom;
pub mod fallback;
pub mod manager;
pub mod retry;

use serde_json::{Map, Value};

use crate::core_types::ErrorRecord;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerHook, CircuitBreakerState, CircuitState};
pub use custom::CustomHook;
pub use fallback::{FallbackHook, FallbackSource};
pub use manager::{ErrorRecoveryManager, RecoveryOutcome};
pub use retry::{RetryConfig, RetryHook};

/// Mutable mapping threaded through every hook of one recovery attempt.
pub type RecoveryContext = Map<String, Value>;

/// Keys hooks read from and write to the [`RecoveryContext`].
pub mod context_keys {
    /// Retry number being scheduled (read and advanced by the retry hook).
    pub const ATTEMPT: &str = "attempt";
    /// Retry verdict written by the retry hook.
    pub const SHOULD_RETRY: &str = "should_retry";
    /// Seconds (float) the caller should wait before retrying.
    pub const RETRY_DELAY: &str = "retry_delay";
    /// Substitute result written by the fallback hook.
    pub const FALLBACK_RESULT: &str = "fallback_result";
    /// Why a fallback function could not produce a value.
    pub const FALLBACK_ERROR: &str = "fallback_error";
    /// Which breaker a failure counts against.
    pub const CIRCUIT_BREAKER_ID: &str = "circuit_breaker_id";
    /// Breaker state after the failure was recorded.
    pub const CIRCUIT_STATE: &str = "circuit_state";
    /// Name of the hook that recovered the error.
    pub const RECOVERED_BY: &str = "recovered_by";
}

/// A policy object deciding whether and how to neutralize an error.
///
/// Implementations must be shareable across threads; hooks with internal
/// state (the circuit breaker) guard it themselves.
#[cfg_attr(test, mockall::automock)]
pub trait RecoveryHook: Send + Sync {
    /// Name used in logs and in `context["recovered_by"]`.
    fn name(&self) -> String {
        "custom".to_string()
    }

    /// Whether this hook applies to `error`.
    fn should_recover(&self, error: &ErrorRecord, context: &RecoveryContext) -> bool;

    /// Try to neutralize `error`.
    ///
    /// `None` means recovered; `Some(record)` hands the (possibly annotated)
    /// error to the next hook.
    fn recover(&self, error: ErrorRecord, context: &mut RecoveryContext) -> Option<ErrorRecord>;
}
