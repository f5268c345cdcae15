//! Error types for the recovery engine itself.
//!
//! These are the engine's *own* failures (a malformed record definition, an
//! out-of-bounds hook configuration, a serialized record that cannot be read
//! back). The failures the engine models are [`ErrorRecord`](crate::ErrorRecord)s,
//! not [`EngineError`]s.
//!
//! # Error Handling Example
//!
//! ```rust
//! use structured_recovery::{data_error, EngineError};
//!
//! match data_error("", "Email is invalid") {
//!     Ok(_) => unreachable!(),
//!     Err(EngineError::InvalidErrorDefinition { message }) => {
//!         println!("Bad definition: {message}");
//!     }
//!     Err(other) => println!("Unexpected: {other}"),
//! }
//! ```
//!
//! # Result Type
//!
//! Use [`EngineResult<T>`] as a convenient alias for `Result<T, EngineError>`.

use crate::core_types::{symbols, ErrorCategory, ErrorRecord, ErrorSeverity};
use crate::logging::{log_error, log_warn};
use thiserror::Error;

/// Convenient result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised by the engine when it is used incorrectly.
///
/// | Variant | Category | Severity |
/// |---------|----------|----------|
/// | `InvalidErrorDefinition` | System | Error |
/// | `ConfigurationError` | System | Error |
/// | `MalformedRecord` | System | Warning |
///
/// Use the constructor methods, which log automatically.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An error record was defined without its required fields.
    ///
    /// Raised at construction time when the symbol or message is empty, or
    /// when a serialized `error_code` disagrees with its category and symbol.
    #[error("Invalid error definition: {message}")]
    InvalidErrorDefinition {
        /// What was wrong with the definition.
        message: String,
    },

    /// A hook configuration is out of bounds or could not be parsed.
    #[error("Recovery configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// A serialized mapping could not be turned back into a record.
    #[error("Malformed error record: {message}")]
    MalformedRecord {
        /// Description of the problem.
        message: String,
        /// The underlying JSON error, if any.
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl EngineError {
    /// Category of this failure within the record taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidErrorDefinition { .. } => ErrorCategory::System,
            Self::ConfigurationError { .. } => ErrorCategory::System,
            Self::MalformedRecord { .. } => ErrorCategory::System,
        }
    }

    /// Severity of this failure within the record taxonomy.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidErrorDefinition { .. } => ErrorSeverity::Error,
            Self::ConfigurationError { .. } => ErrorSeverity::Error,
            Self::MalformedRecord { .. } => ErrorSeverity::Warning,
        }
    }

    /// Stable symbol for this failure.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::InvalidErrorDefinition { .. } => symbols::INVALID_ERROR_DEFINITION,
            Self::ConfigurationError { .. } => symbols::INVALID_CONFIGURATION,
            Self::MalformedRecord { .. } => symbols::MALFORMED_RECORD,
        }
    }

    /// Convert into an [`ErrorRecord`] so engine failures can flow through
    /// collections and recovery like any other failure.
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord::from_parts(self.category(), self.symbol(), self.to_string())
            .with_severity(self.severity())
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    /// Create an invalid definition error (logs at ERROR level).
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "invalid_error_definition",
            message = %message,
            "Error record definition rejected"
        );
        Self::InvalidErrorDefinition { message }
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Recovery configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn malformed_record(message: impl Into<String>, source: Option<serde_json::Error>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "malformed_record",
            message = %message,
            has_source = source.is_some(),
            "Serialized error record could not be read"
        );
        Self::MalformedRecord { message, source }
    }
}
