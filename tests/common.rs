//! Test helper utilities for structured-recovery integration tests
//!
//! This module provides reusable fixtures shared across the integration test
//! binaries.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use structured_recovery::{
    context_keys, ErrorRecord, ErrorRecoveryManager, RecoveryContext, RetryConfig,
};

/// Retry config with the 0.1s / 0.2s / 0.4s schedule.
pub fn fast_retry_config(symbols: &[&str]) -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        exponential_backoff: true,
        ..RetryConfig::default()
    }
    .with_symbols(symbols.iter().copied())
}

/// Simulated dependency that fails a fixed number of times before succeeding.
#[derive(Debug, Clone)]
pub struct FlakyDependency {
    failures_before_success: u32,
    calls: Arc<AtomicU32>,
}

impl FlakyDependency {
    pub fn new(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn call(&self) -> Result<&'static str, std::io::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "upstream request timed out",
            ))
        } else {
            Ok("payload")
        }
    }
}

/// Result of driving an operation through a recovery manager.
#[derive(Debug)]
pub enum Driven {
    Succeeded(&'static str),
    Recovered(RecoveryContext),
    Failed(ErrorRecord, RecoveryContext),
}

/// Caller-side loop: run, convert failures, consult the manager, sleep on retry.
///
/// The manager only decides; this loop is where waiting and re-running happen.
pub async fn drive(
    manager: &ErrorRecoveryManager,
    dependency: &FlakyDependency,
    mut context: RecoveryContext,
) -> Driven {
    loop {
        let failure = match dependency.call().await {
            Ok(value) => return Driven::Succeeded(value),
            Err(e) => ErrorRecord::from_exception(&e, None, None),
        };

        let outcome = manager.attempt_recovery(failure, context);
        let should_retry = outcome
            .context
            .get(context_keys::SHOULD_RETRY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        match (outcome.recovered, outcome.remaining_error) {
            (true, _) if should_retry => {
                let delay = outcome
                    .context
                    .get(context_keys::RETRY_DELAY)
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(0.0);
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                context = outcome.context;
            }
            (true, _) => return Driven::Recovered(outcome.context),
            (false, Some(error)) => return Driven::Failed(error, outcome.context),
            (false, None) => panic!("unrecovered outcome must carry the error"),
        }
    }
}
