//! # structured-recovery
//!
//! Structured error records and a pluggable recovery pipeline for
//! request/command-style execution.
//!
//! ## Key Features
//!
//! - **Error Records**: Serializable failures with category, severity, symbol, path,
//!   diagnostics, remediation hints and a cause chain
//! - **Error Collections**: Ordered aggregation with filtering, grouping, summaries
//!   and a human-readable report
//! - **Recovery Hooks**: Retry with backoff, fallback values, per-identifier circuit
//!   breakers and custom hooks, chained by [`ErrorRecoveryManager`]
//! - **Non-blocking**: Hooks only decide; sleeping and re-running stay with the caller
//!
//! ## Example
//!
//! ```rust
//! use structured_recovery::{
//!     external_error, ErrorRecoveryManager, RecoveryContext, RetryConfig,
//! };
//! use std::time::Duration;
//!
//! # fn main() -> structured_recovery::EngineResult<()> {
//! let mut manager = ErrorRecoveryManager::new();
//! manager.add_retry_hook(RetryConfig {
//!     initial_delay: Duration::from_millis(100),
//!     ..RetryConfig::default()
//! }
//! .with_symbols(["timeout"]))?;
//!
//! let error = external_error("timeout", "Payment gateway timed out")?;
//! let (recovered, remaining, context) = manager
//!     .attempt_recovery(error, RecoveryContext::new())
//!     .into_parts();
//!
//! assert!(recovered);
//! assert!(remaining.is_none());
//! assert_eq!(context["should_retry"], true);
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod clock;
pub mod collection;
pub mod config;
pub mod conversion;
pub mod core_types;
pub mod error;
pub mod recovery;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{CollectionSummary, ErrorCollection};
pub use config::RecoveryConfig;
pub use conversion::{ExceptionMapper, MappingRule, DEFAULT_MAPPER};
pub use error::{EngineError, EngineResult};

pub use core_types::{
    auth_error, data_error, domain_error, external_error, runtime_error, symbols, system_error,
    ErrorCategory, ErrorRecord, ErrorSeverity, PathSegment,
};

pub use recovery::{
    context_keys, CircuitBreakerConfig, CircuitBreakerHook, CircuitBreakerState, CircuitState,
    CustomHook, ErrorRecoveryManager, FallbackHook, FallbackSource, RecoveryContext,
    RecoveryHook, RecoveryOutcome, RetryConfig, RetryHook,
};
