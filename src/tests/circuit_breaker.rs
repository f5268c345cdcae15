// Unit Tests for Circuit Breaker
//
// UNIT UNDER TEST: CircuitBreakerHook
//
// BUSINESS RESPONSIBILITY:
//   - Tracks dependency health per identifier
//   - Stops calls to a failing dependency and probes it again after a timeout
//   - Records failures from the recovery chain without ever suppressing them
//
// TEST COVERAGE:
//   - Full CLOSED -> OPEN -> HALF_OPEN -> CLOSED cycle on a manual clock
//   - HALF_OPEN failure reopening with a fresh timeout
//   - Failure streak reset by successes while CLOSED
//   - Counter saturation and snapshot restore
//   - Identifier isolation, unknown identifiers, reset
//   - Hook behavior inside the recovery chain

use crate::clock::Clock;
use crate::error::EngineError;
use crate::recovery::{
    context_keys, CircuitBreakerConfig, CircuitBreakerHook, CircuitBreakerState, CircuitState,
    RecoveryContext, RecoveryHook,
};
use crate::tests::helpers::{context_with, manual_circuit_breaker, timeout_error};
use std::time::Duration;

const SERVICE: &str = "payment_service";

#[cfg(test)]
mod state_machine_tests {
    use super::*;

    #[test]
    fn test_full_cycle_with_simulated_time() {
        // Test verifies the documented open/probe/close scenario

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();

        // Act & Assert: five failures open the circuit
        for _ in 0..4 {
            assert_eq!(breaker.record_failure(SERVICE), CircuitState::Closed);
        }
        assert_eq!(breaker.record_failure(SERVICE), CircuitState::Open);
        assert!(!breaker.check_before_execution(SERVICE));

        // Before the timeout nothing passes
        clock.advance(Duration::from_secs(59));
        assert!(!breaker.check_before_execution(SERVICE));

        // At 61s the probe is admitted
        clock.advance(Duration::from_secs(2));
        assert!(breaker.check_before_execution(SERVICE));
        assert_eq!(breaker.state(SERVICE), CircuitState::HalfOpen);

        // Two successes close it again
        assert_eq!(breaker.record_success(SERVICE), CircuitState::HalfOpen);
        assert_eq!(breaker.record_success(SERVICE), CircuitState::Closed);

        let snapshot = breaker.snapshot(SERVICE).expect("state recorded");
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.success_count, 0);
        assert!(snapshot.opened_at.is_none());
    }

    #[test]
    fn test_timeout_boundary_is_inclusive() {
        // Test verifies the circuit probes exactly when the timeout elapses

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }

        // Act
        clock.advance(Duration::from_secs(60));

        // Assert
        assert!(breaker.check_before_execution(SERVICE));
    }

    #[test]
    fn test_half_open_failure_reopens_with_fresh_timeout() {
        // Test verifies a failed probe restarts the OPEN period

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }
        clock.advance(Duration::from_secs(61));
        assert!(breaker.check_before_execution(SERVICE));

        // Act
        let state = breaker.record_failure(SERVICE);

        // Assert
        assert_eq!(state, CircuitState::Open);
        clock.advance(Duration::from_secs(30));
        assert!(!breaker.check_before_execution(SERVICE));
        clock.advance(Duration::from_secs(30));
        assert!(breaker.check_before_execution(SERVICE));
    }

    #[test]
    fn test_half_open_probe_success_count_restarts_after_reopen() {
        // Test verifies successes from an earlier probe window do not carry over

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }
        clock.advance(Duration::from_secs(60));
        breaker.check_before_execution(SERVICE);
        breaker.record_success(SERVICE);
        breaker.record_failure(SERVICE);
        clock.advance(Duration::from_secs(60));
        breaker.check_before_execution(SERVICE);

        // Act
        let state = breaker.record_success(SERVICE);

        // Assert
        assert_eq!(state, CircuitState::HalfOpen);
    }

    #[test]
    fn test_success_while_closed_clears_failure_streak() {
        // Test verifies only consecutive failures open the circuit

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        for _ in 0..4 {
            breaker.record_failure(SERVICE);
        }

        // Act
        breaker.record_success(SERVICE);
        for _ in 0..4 {
            breaker.record_failure(SERVICE);
        }

        // Assert
        assert_eq!(breaker.state(SERVICE), CircuitState::Closed);
        assert_eq!(breaker.snapshot(SERVICE).map(|s| s.failure_count), Some(4));
    }

    #[test]
    fn test_failure_while_open_keeps_original_opened_at() {
        // Test verifies extra failures do not postpone probing

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }
        let opened_at = breaker.snapshot(SERVICE).and_then(|s| s.opened_at);

        // Act
        clock.advance(Duration::from_secs(10));
        breaker.record_failure(SERVICE);

        // Assert
        let snapshot = breaker.snapshot(SERVICE).expect("state recorded");
        assert_eq!(snapshot.opened_at, opened_at);
        assert_eq!(snapshot.failure_count, 6);
        clock.advance(Duration::from_secs(50));
        assert!(breaker.check_before_execution(SERVICE));
    }

    #[test]
    fn test_failure_count_saturates_while_open() {
        // Test verifies a long-lived open circuit cannot overflow its failure counter

        // Arrange
        let (breaker, clock) = manual_circuit_breaker();
        breaker.restore(
            SERVICE,
            CircuitBreakerState {
                state: CircuitState::Open,
                failure_count: u32::MAX,
                success_count: 0,
                opened_at: Some(clock.now()),
            },
        );

        // Act
        let state = breaker.record_failure(SERVICE);

        // Assert
        assert_eq!(state, CircuitState::Open);
        assert_eq!(breaker.snapshot(SERVICE).map(|s| s.failure_count), Some(u32::MAX));
    }

    #[test]
    fn test_restored_snapshot_continues_on_another_breaker() {
        // Test verifies health state carried between breakers keeps its timeout

        // Arrange
        let (source, clock) = manual_circuit_breaker();
        for _ in 0..5 {
            source.record_failure(SERVICE);
        }
        let snapshot = source.snapshot(SERVICE).expect("state recorded");
        let target = CircuitBreakerHook::with_clock(source.config().clone(), clock.clone())
            .expect("valid breaker config");

        // Act
        target.restore(SERVICE, snapshot);

        // Assert
        assert!(!target.check_before_execution(SERVICE));
        clock.advance(Duration::from_secs(60));
        assert!(target.check_before_execution(SERVICE));
        assert_eq!(target.state(SERVICE), CircuitState::HalfOpen);
    }

    #[test]
    fn test_success_while_open_is_ignored() {
        // Test verifies a stray success cannot close an OPEN circuit

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }

        // Act
        let state = breaker.record_success(SERVICE);

        // Assert
        assert_eq!(state, CircuitState::Open);
        assert!(!breaker.check_before_execution(SERVICE));
    }
}

#[cfg(test)]
mod identifier_tests {
    use super::*;

    #[test]
    fn test_unknown_identifier_is_closed_and_allowed() {
        // Test verifies identifiers without history behave as healthy

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();

        // Act & Assert
        assert!(breaker.check_before_execution("never_seen"));
        assert_eq!(breaker.state("never_seen"), CircuitState::Closed);
        assert_eq!(breaker.record_success("never_seen"), CircuitState::Closed);
        assert!(breaker.snapshot("never_seen").is_none());
        assert!(breaker.ids().is_empty());
    }

    #[test]
    fn test_identifiers_are_isolated() {
        // Test verifies one dependency failing does not gate another

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();

        // Act
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }
        breaker.record_failure("inventory_service");

        // Assert
        assert!(!breaker.check_before_execution(SERVICE));
        assert!(breaker.check_before_execution("inventory_service"));
        let mut ids = breaker.ids();
        ids.sort();
        assert_eq!(ids, vec!["inventory_service".to_string(), SERVICE.to_string()]);
    }

    #[test]
    fn test_reset_forgets_identifier() {
        // Test verifies manual reset closes the circuit

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        for _ in 0..5 {
            breaker.record_failure(SERVICE);
        }

        // Act
        breaker.reset(SERVICE);

        // Assert
        assert!(breaker.check_before_execution(SERVICE));
        assert!(breaker.snapshot(SERVICE).is_none());
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        // Test verifies configuration validation

        // Arrange
        let config = CircuitBreakerConfig {
            failure_threshold: 0,
            ..CircuitBreakerConfig::default()
        };

        // Act
        let result = CircuitBreakerHook::new(config);

        // Assert
        assert!(matches!(result, Err(EngineError::ConfigurationError { .. })));
    }
}

#[cfg(test)]
mod hook_tests {
    use super::*;

    #[test]
    fn test_recover_records_failure_and_returns_error() {
        // Test verifies the hook never suppresses the error

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        let mut context = context_with(context_keys::CIRCUIT_BREAKER_ID, SERVICE);
        let error = timeout_error().with_context("request_id", "r-17");

        // Act
        let result = breaker.recover(error.clone(), &mut context);

        // Assert
        assert_eq!(result, Some(error));
        assert_eq!(context[context_keys::CIRCUIT_STATE], "closed");
        assert_eq!(breaker.snapshot(SERVICE).map(|s| s.failure_count), Some(1));
    }

    #[test]
    fn test_recover_reports_open_state_on_threshold() {
        // Test verifies the context reflects the state after recording

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        let mut context = context_with(context_keys::CIRCUIT_BREAKER_ID, SERVICE);

        // Act
        for _ in 0..5 {
            let _ = breaker.recover(timeout_error(), &mut context);
        }

        // Assert
        assert_eq!(context[context_keys::CIRCUIT_STATE], "open");
    }

    #[test]
    fn test_should_recover_requires_string_identifier() {
        // Test verifies the hook only applies when the context names a breaker

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        let error = timeout_error();

        // Act & Assert
        assert!(breaker.should_recover(&error, &context_with(context_keys::CIRCUIT_BREAKER_ID, SERVICE)));
        assert!(!breaker.should_recover(&error, &RecoveryContext::new()));
        assert!(!breaker.should_recover(&error, &context_with(context_keys::CIRCUIT_BREAKER_ID, 42)));
        assert_eq!(breaker.name(), "circuit_breaker");
    }

    #[test]
    fn test_recover_without_identifier_records_nothing() {
        // Test verifies direct calls without an id leave state untouched

        // Arrange
        let (breaker, _clock) = manual_circuit_breaker();
        let mut context = RecoveryContext::new();

        // Act
        let result = breaker.recover(timeout_error(), &mut context);

        // Assert
        assert!(result.is_some());
        assert!(breaker.ids().is_empty());
        assert!(context.get(context_keys::CIRCUIT_STATE).is_none());
    }
}
