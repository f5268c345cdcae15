//! Test helper utilities shared across unit test modules
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

#![allow(dead_code)]

use crate::clock::ManualClock;
use crate::core_types::{
    data_error, external_error, runtime_error, ErrorRecord, ErrorSeverity,
};
use crate::recovery::{CircuitBreakerConfig, CircuitBreakerHook, RecoveryContext, RetryConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Build a record, panicking on invalid definitions (test failure is appropriate).
pub fn record(result: crate::EngineResult<ErrorRecord>) -> ErrorRecord {
    result.expect("test record definition should be valid")
}

pub fn email_error() -> ErrorRecord {
    record(data_error("invalid_email", "Email is invalid"))
        .at_path(["email"])
        .with_suggestion("Use a valid email address")
}

pub fn name_error() -> ErrorRecord {
    record(data_error("required_field", "Name is required")).at_path(["name"])
}

pub fn crash_error() -> ErrorRecord {
    record(runtime_error("handler_crashed", "Handler crashed"))
        .with_severity(ErrorSeverity::Critical)
}

pub fn timeout_error() -> ErrorRecord {
    record(external_error("timeout", "Upstream timed out"))
}

/// Retry config used by the testable backoff table: 0.1s doubling, 3 retries.
pub fn backoff_table_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        exponential_backoff: true,
        ..RetryConfig::default()
    }
    .with_symbols(["timeout"])
}

/// Breaker (5 failures / 2 successes / 60s) on a manual clock.
pub fn manual_circuit_breaker() -> (CircuitBreakerHook, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let hook = CircuitBreakerHook::with_clock(
        CircuitBreakerConfig {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        },
        clock.clone(),
    )
    .expect("test circuit breaker config should be valid");
    (hook, clock)
}

pub fn context_with(key: &str, value: impl Into<Value>) -> RecoveryContext {
    let mut context = RecoveryContext::new();
    context.insert(key.to_string(), value.into());
    context
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
