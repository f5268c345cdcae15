// Unit Tests for Native Failure Conversion
//
// UNIT UNDER TEST: ExceptionMapper, ErrorRecord::from_exception / from_anyhow
//
// BUSINESS RESPONSIBILITY:
//   - Classifies arbitrary std::error::Error values into category and symbol
//   - Keeps the native message and turns the source() chain into a cause chain
//   - Lets callers override the table per call or extend it with rules
//
// TEST COVERAGE:
//   - Built-in rules for common I/O and parse failures
//   - Fallback to runtime.unexpected_error
//   - Explicit symbol/category overrides
//   - Rule precedence and custom severities
//   - anyhow context chains

use crate::conversion::{ExceptionMapper, MappingRule};
use crate::core_types::{ErrorCategory, ErrorRecord, ErrorSeverity};
use crate::error::EngineError;
use std::io;

#[derive(Debug, thiserror::Error)]
#[error("Failed to load profile")]
struct LoadProfileError {
    #[source]
    source: io::Error,
}

#[cfg(test)]
mod default_mapping_tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_external_timeout() {
        // Test verifies the documented timeout example

        // Arrange
        let failure = io::Error::new(io::ErrorKind::TimedOut, "operation timed out");

        // Act
        let record = ErrorRecord::from_exception(&failure, None, None);

        // Assert
        assert_eq!(record.error_code(), "external.timeout");
        assert_eq!(record.message(), "operation timed out");
        assert!(record.cause().is_none());
    }

    #[test]
    fn test_parse_failure_maps_to_data_error() {
        // Test verifies integer parse errors classify as data problems

        // Arrange
        let failure = "abc".parse::<i32>().expect_err("not a number");

        // Act
        let record = ErrorRecord::from_exception(&failure, None, None);

        // Assert
        assert_eq!(record.category(), ErrorCategory::Data);
        assert_eq!(record.symbol(), "parse_error");
    }

    #[test]
    fn test_unmatched_failure_becomes_unexpected_runtime_error() {
        // Test verifies the fallback classification

        // Arrange
        let failure = io::Error::new(io::ErrorKind::Other, "the flux capacitor melted");

        // Act
        let record = ErrorRecord::from_exception(&failure, None, None);

        // Assert
        assert_eq!(record.error_code(), "runtime.unexpected_error");
        assert_eq!(record.severity(), ErrorSeverity::Error);
        assert_eq!(record.message(), "the flux capacitor melted");
    }

    #[test]
    fn test_empty_message_is_replaced() {
        // Test verifies conversion never produces a record without a message

        // Arrange
        let failure = io::Error::new(io::ErrorKind::Other, "");

        // Act
        let record = ErrorRecord::from_exception(&failure, None, None);

        // Assert
        assert_eq!(record.message(), "Unknown failure");
    }

    #[test]
    fn test_source_chain_becomes_cause_chain() {
        // Test verifies each source() level is converted and linked in order

        // Arrange
        let failure = LoadProfileError {
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        };

        // Act
        let record = ErrorRecord::from_exception(&failure, None, None);

        // Assert
        let codes: Vec<String> = record.error_chain().iter().map(|r| r.error_code()).collect();
        assert_eq!(
            codes,
            vec!["runtime.unexpected_error", "external.connection_failed"]
        );
        assert_eq!(record.root_cause().message(), "connection refused");
    }
}

#[cfg(test)]
mod override_tests {
    use super::*;

    #[test]
    fn test_explicit_symbol_and_category_win_over_table() {
        // Test verifies caller overrides apply to the outermost record only

        // Arrange
        let failure = LoadProfileError {
            source: io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        };

        // Act
        let record =
            ErrorRecord::from_exception(&failure, Some("profile_unavailable"), Some(ErrorCategory::Domain));

        // Assert
        assert_eq!(record.error_code(), "domain.profile_unavailable");
        assert_eq!(record.severity(), ErrorSeverity::Warning);
        assert_eq!(record.cause().map(|c| c.error_code()), Some("external.timeout".to_string()));
    }

    #[test]
    fn test_symbol_override_keeps_table_category() {
        // Test verifies overriding only the symbol leaves classification intact

        // Arrange
        let failure = io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded");

        // Act
        let record = ErrorRecord::from_exception(&failure, Some("gateway_timeout"), None);

        // Assert
        assert_eq!(record.error_code(), "external.gateway_timeout");
    }

    #[test]
    fn test_prepended_rule_takes_precedence() {
        // Test verifies earlier rules win and carry their severity

        // Arrange
        let mut mapper = ExceptionMapper::with_defaults();
        let rule = MappingRule::new(r"(?i)payment .* timed out", ErrorCategory::Domain, "payment_timeout")
            .expect("valid rule")
            .with_severity(ErrorSeverity::Critical);
        mapper.prepend_rule(rule);
        let failure = io::Error::new(io::ErrorKind::TimedOut, "Payment gateway timed out");

        // Act
        let record = mapper.convert(&failure, None, None);

        // Assert
        assert_eq!(record.error_code(), "domain.payment_timeout");
        assert_eq!(record.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_appended_rule_only_applies_when_defaults_miss() {
        // Test verifies add_rule does not shadow the built-in rules

        // Arrange
        let mut mapper = ExceptionMapper::with_defaults();
        mapper.add_rule(
            MappingRule::new(r"(?i)timed out|card declined", ErrorCategory::Domain, "card_declined")
                .expect("valid rule"),
        );

        // Act
        let timeout = mapper.convert(&io::Error::new(io::ErrorKind::Other, "timed out"), None, None);
        let declined = mapper.convert(&io::Error::new(io::ErrorKind::Other, "card declined"), None, None);

        // Assert
        assert_eq!(timeout.error_code(), "external.timeout");
        assert_eq!(declined.error_code(), "domain.card_declined");
    }

    #[test]
    fn test_empty_mapper_classifies_nothing() {
        // Test verifies a bare mapper always falls back

        // Arrange
        let mapper = ExceptionMapper::new();

        // Act
        let record = mapper.convert(&io::Error::new(io::ErrorKind::TimedOut, "timed out"), None, None);

        // Assert
        assert!(mapper.rules().is_empty());
        assert_eq!(record.error_code(), "runtime.unexpected_error");
    }

    #[test]
    fn test_invalid_rule_definitions_are_rejected() {
        // Test verifies malformed patterns and blank symbols fail at construction

        // Arrange & Act
        let bad_pattern = MappingRule::new("(", ErrorCategory::Data, "broken");
        let blank_symbol = MappingRule::new("ok", ErrorCategory::Data, " ");

        // Assert
        assert!(matches!(bad_pattern, Err(EngineError::ConfigurationError { .. })));
        assert!(matches!(blank_symbol, Err(EngineError::InvalidErrorDefinition { .. })));
    }
}

#[cfg(test)]
mod anyhow_tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_anyhow_context_chain_becomes_cause_chain() {
        // Test verifies context layers become outer records

        // Arrange
        let failure = Err::<(), _>(io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))
            .context("Reading settings")
            .expect_err("context wraps the error");

        // Act
        let record = ErrorRecord::from_anyhow(&failure, None, None);

        // Assert
        assert_eq!(record.error_code(), "runtime.unexpected_error");
        assert_eq!(record.message(), "Reading settings");
        assert_eq!(record.root_cause().error_code(), "runtime.not_found");
        assert_eq!(record.error_chain().len(), 2);
    }

    #[test]
    fn test_anyhow_message_without_source() {
        // Test verifies a plain anyhow message converts to a single record

        // Arrange
        let failure = anyhow::anyhow!("Too many requests, slow down");

        // Act
        let record = ErrorRecord::from_anyhow(&failure, None, None);

        // Assert
        assert_eq!(record.error_code(), "external.rate_limited");
        assert!(record.cause().is_none());
    }
}
