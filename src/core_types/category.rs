//! Error taxonomy: the closed category set and the ordered severity scale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Closed classification of where a failure originated.
///
/// The set is fixed; it is not extensible at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Input validation and data-shape problems.
    Data,
    /// Unexpected failures while executing code.
    Runtime,
    /// Business-rule violations.
    Domain,
    /// Infrastructure and resource failures.
    System,
    /// Authentication and authorization failures.
    Auth,
    /// Failures of external services and dependencies.
    External,
}

impl ErrorCategory {
    /// Every category, in declaration order.
    pub const ALL: [ErrorCategory; 6] = [
        Self::Data,
        Self::Runtime,
        Self::Domain,
        Self::System,
        Self::Auth,
        Self::External,
    ];

    /// Lowercase wire name (`"data"`, `"runtime"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Runtime => "runtime",
            Self::Domain => "domain",
            Self::System => "system",
            Self::Auth => "auth",
            Self::External => "external",
        }
    }

    /// Severity applied by the category constructors when none is given.
    pub fn default_severity(&self) -> ErrorSeverity {
        match self {
            Self::Data => ErrorSeverity::Error,
            Self::Runtime => ErrorSeverity::Error,
            Self::Domain => ErrorSeverity::Warning,
            Self::System => ErrorSeverity::Critical,
            Self::Auth => ErrorSeverity::Error,
            Self::External => ErrorSeverity::Error,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::malformed_record(format!("Unknown error category: {s}"), None))
    }
}

/// Urgency classification with a total order, `Debug < ... < Fatal`.
///
/// Variant order is the ordering; sorting and grouping rely on the derived `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
    Critical,
    Fatal,
}

impl ErrorSeverity {
    /// Every severity, lowest first.
    pub const ALL: [ErrorSeverity; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Fatal,
    ];

    /// Lowercase wire name (`"debug"`, ..., `"fatal"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::Fatal => "fatal",
        }
    }

    /// Critical or above.
    pub fn is_critical(&self) -> bool {
        *self >= Self::Critical
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorSeverity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::malformed_record(format!("Unknown error severity: {s}"), None))
    }
}
