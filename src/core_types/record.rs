//! The error record: one failure instance with category, severity, symbol,
//! location, diagnostics and an optional cause chain.
//!
//! Records are built once, enriched with the builder methods
//! (`with_cause`, `with_suggestion`, `capture_stack_trace`, ...) and then handed
//! off. Once a record sits in a collection that has been summarized it should
//! not be touched again.
//!
//! # Example
//!
//! ```rust
//! use structured_recovery::{data_error, external_error};
//!
//! # fn main() -> structured_recovery::EngineResult<()> {
//! let root = external_error("timeout", "Upstream did not answer")?;
//! let err = data_error("invalid_email", "Email is invalid")?
//!     .at_path(["user", "email"])
//!     .with_suggestion("Use user@example.com")
//!     .with_cause(root);
//!
//! assert_eq!(err.error_code(), "data.invalid_email");
//! assert_eq!(err.error_chain().len(), 2);
//! assert_eq!(err.root_cause().symbol(), "timeout");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core_types::catalog;
use crate::core_types::category::{ErrorCategory, ErrorSeverity};
use crate::error::{EngineError, EngineResult};
use crate::logging::{log_debug, log_error, log_info, log_warn};

/// One key in a record's location path.
///
/// Serialized untagged: an integer for [`PathSegment::Index`], a string for
/// [`PathSegment::Key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position within a list.
    Index(usize),
    /// Field name within a mapping.
    Key(String),
}

impl PathSegment {
    fn to_value(&self) -> Value {
        match self {
            Self::Index(index) => Value::from(*index),
            Self::Key(key) => Value::String(key.clone()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Join a path with `.` (`["items", 0, "sku"]` → `items.0.sku`).
pub fn join_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// A single failure instance.
///
/// Build one with the category constructors ([`data_error`], [`runtime_error`],
/// ...) or [`ErrorRecord::new`]; construction fails with
/// [`EngineError::InvalidErrorDefinition`] when the symbol or message is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    category: ErrorCategory,
    severity: ErrorSeverity,
    symbol: String,
    path: Vec<PathSegment>,
    message: String,
    context: Map<String, Value>,
    suggestion: Option<String>,
    help_url: Option<String>,
    is_fatal: bool,
    cause: Option<Box<ErrorRecord>>,
    stack_trace: Option<Vec<String>>,
    timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    /// Create a record with severity [`ErrorSeverity::Error`].
    ///
    /// The category constructors ([`data_error`] and friends) apply the
    /// category's own default severity instead.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidErrorDefinition`] if `symbol` or
    /// `message` is empty or whitespace.
    pub fn new(
        category: ErrorCategory,
        symbol: impl Into<String>,
        message: impl Into<String>,
    ) -> EngineResult<Self> {
        let symbol = symbol.into();
        let message = message.into();

        if symbol.trim().is_empty() {
            return Err(EngineError::invalid_definition(format!(
                "{category} error requires a non-empty symbol"
            )));
        }
        if message.trim().is_empty() {
            return Err(EngineError::invalid_definition(format!(
                "{category}.{symbol} requires a non-empty message"
            )));
        }

        Ok(Self::from_parts(category, symbol, message))
    }

    /// Build without validation; callers guarantee non-empty symbol and message.
    pub(crate) fn from_parts(
        category: ErrorCategory,
        symbol: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let record = Self {
            category,
            severity: ErrorSeverity::Error,
            symbol: symbol.into(),
            path: Vec::new(),
            message: message.into(),
            context: Map::new(),
            suggestion: None,
            help_url: None,
            is_fatal: false,
            cause: None,
            stack_trace: None,
            timestamp: Utc::now(),
        };
        log_debug!(
            error_code = %record.error_code(),
            severity = %record.severity,
            "Error record created"
        );
        record
    }

    // =========================================================================
    // Builder-style enrichment
    // =========================================================================

    /// Locate the error within nested input/output data.
    pub fn at_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Add one diagnostic value to the context mapping.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Merge a whole mapping into the context, overwriting duplicate keys.
    pub fn with_context_map(mut self, context: Map<String, Value>) -> Self {
        self.context.extend(context);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Fill a missing suggestion from the catalog; an existing one is kept.
    pub fn with_default_suggestion(mut self) -> Self {
        if self.suggestion.is_none() {
            self.suggestion = catalog::suggestion_for(&self.symbol).map(str::to_string);
        }
        self
    }

    pub fn with_help_url(mut self, help_url: impl Into<String>) -> Self {
        self.help_url = Some(help_url.into());
        self
    }

    /// Point `help_url` at the generated docs page for this error code,
    /// unless a link is already set.
    pub fn with_default_help_url(mut self) -> Self {
        if self.help_url.is_none() {
            self.help_url = Some(catalog::help_url_for(&self.error_code()));
        }
        self
    }

    /// Mark this instance as one that must halt the enclosing operation.
    ///
    /// Independent of severity.
    pub fn fatal(mut self) -> Self {
        self.is_fatal = true;
        self
    }

    /// Attach the antecedent failure.
    ///
    /// The cause keeps its own chain untouched; this record's previous cause,
    /// if any, is replaced.
    pub fn with_cause(mut self, cause: ErrorRecord) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Record the current call frames. Not retroactive: the trace is where
    /// this method was called, not where the record was created.
    pub fn capture_stack_trace(&mut self) {
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        self.stack_trace = Some(
            trace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }

    /// Builder form of [`capture_stack_trace`](Self::capture_stack_trace).
    pub fn with_stack_trace(mut self) -> Self {
        self.capture_stack_trace();
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn help_url(&self) -> Option<&str> {
        self.help_url.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.is_fatal
    }

    pub fn cause(&self) -> Option<&ErrorRecord> {
        self.cause.as_deref()
    }

    pub fn stack_trace(&self) -> Option<&[String]> {
        self.stack_trace.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Stable external identifier, `"{category}.{symbol}"`.
    pub fn error_code(&self) -> String {
        format!("{}.{}", self.category, self.symbol)
    }

    /// Whether the suggestion is present and non-empty.
    pub fn has_suggestion(&self) -> bool {
        self.suggestion.as_deref().is_some_and(|s| !s.is_empty())
    }

    // =========================================================================
    // Cause chain
    // =========================================================================

    /// `[self, cause, cause.cause, ...]`, ending at the record without a cause.
    pub fn error_chain(&self) -> Vec<&ErrorRecord> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(cause) = current.cause.as_deref() {
            chain.push(cause);
            current = cause;
        }
        chain
    }

    /// Last element of [`error_chain`](Self::error_chain); `self` when there is no cause.
    pub fn root_cause(&self) -> &ErrorRecord {
        let mut current = self;
        while let Some(cause) = current.cause.as_deref() {
            current = cause;
        }
        current
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize to the wire mapping.
    ///
    /// `stack_trace` is only present when requested *and* captured. `cause` is
    /// present only when set.
    pub fn to_dict(&self, include_stack_trace: bool) -> Value {
        let mut map = Map::new();
        map.insert("error_code".into(), Value::String(self.error_code()));
        map.insert("category".into(), Value::from(self.category.as_str()));
        map.insert("severity".into(), Value::from(self.severity.as_str()));
        map.insert("symbol".into(), Value::String(self.symbol.clone()));
        map.insert(
            "path".into(),
            Value::Array(self.path.iter().map(PathSegment::to_value).collect()),
        );
        map.insert("message".into(), Value::String(self.message.clone()));
        map.insert("context".into(), Value::Object(self.context.clone()));
        map.insert(
            "suggestion".into(),
            self.suggestion.clone().map_or(Value::Null, Value::String),
        );
        map.insert(
            "help_url".into(),
            self.help_url.clone().map_or(Value::Null, Value::String),
        );
        map.insert("is_fatal".into(), Value::Bool(self.is_fatal));
        if include_stack_trace {
            if let Some(trace) = &self.stack_trace {
                map.insert(
                    "stack_trace".into(),
                    Value::Array(trace.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        map.insert("timestamp".into(), Value::String(self.timestamp.to_rfc3339()));
        if let Some(cause) = &self.cause {
            map.insert("cause".into(), cause.to_dict(include_stack_trace));
        }
        Value::Object(map)
    }

    /// Rebuild a record from [`to_dict`](Self::to_dict) output.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MalformedRecord`] if the mapping is missing fields or
    ///   carries an unknown category/severity
    /// - [`EngineError::InvalidErrorDefinition`] if the symbol or message is
    ///   empty, or `error_code` disagrees with category and symbol
    pub fn from_dict(value: &Value) -> EngineResult<Self> {
        let wire: WireRecord = serde_json::from_value(value.clone()).map_err(|e| {
            EngineError::malformed_record(format!("Cannot read error record: {e}"), Some(e))
        })?;
        wire.into_record()
    }

    /// Emit this record through `tracing` at a level matching its severity.
    pub fn log(&self) {
        let error_code = self.error_code();
        let path = join_path(&self.path);
        match self.severity {
            ErrorSeverity::Debug => log_debug!(
                error_code = %error_code, path = %path, is_fatal = self.is_fatal,
                "{}", self.message
            ),
            ErrorSeverity::Info => log_info!(
                error_code = %error_code, path = %path, is_fatal = self.is_fatal,
                "{}", self.message
            ),
            ErrorSeverity::Warning => log_warn!(
                error_code = %error_code, path = %path, is_fatal = self.is_fatal,
                "{}", self.message
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical | ErrorSeverity::Fatal => log_error!(
                error_code = %error_code, path = %path, severity = %self.severity,
                is_fatal = self.is_fatal, "{}", self.message
            ),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)
    }
}

impl std::error::Error for ErrorRecord {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Deserialization shape of [`ErrorRecord::to_dict`].
#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    error_code: Option<String>,
    category: ErrorCategory,
    severity: ErrorSeverity,
    symbol: String,
    #[serde(default)]
    path: Vec<PathSegment>,
    message: String,
    #[serde(default)]
    context: Map<String, Value>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    help_url: Option<String>,
    #[serde(default)]
    is_fatal: bool,
    #[serde(default)]
    stack_trace: Option<Vec<String>>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    cause: Option<Box<WireRecord>>,
}

impl WireRecord {
    fn into_record(self) -> EngineResult<ErrorRecord> {
        let mut record = ErrorRecord::new(self.category, self.symbol, self.message)?;

        if let Some(code) = self.error_code {
            if code != record.error_code() {
                return Err(EngineError::invalid_definition(format!(
                    "error_code '{code}' does not match category and symbol '{}'",
                    record.error_code()
                )));
            }
        }

        record.severity = self.severity;
        record.path = self.path;
        record.context = self.context;
        record.suggestion = self.suggestion;
        record.help_url = self.help_url;
        record.is_fatal = self.is_fatal;
        record.stack_trace = self.stack_trace;
        if let Some(timestamp) = self.timestamp {
            record.timestamp = timestamp;
        }
        if let Some(cause) = self.cause {
            record.cause = Some(Box::new(cause.into_record()?));
        }
        Ok(record)
    }
}

// ============================================================================
// Category constructors
// ============================================================================
//
// One record type, six constructors; each fixes the category and its default
// severity. Chain the builder methods for path, suggestion and context.

fn categorized(
    category: ErrorCategory,
    symbol: impl Into<String>,
    message: impl Into<String>,
) -> EngineResult<ErrorRecord> {
    ErrorRecord::new(category, symbol, message)
        .map(|record| record.with_severity(category.default_severity()))
}

/// Input validation or data-shape failure (default severity: error).
pub fn data_error(symbol: impl Into<String>, message: impl Into<String>) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::Data, symbol, message)
}

/// Unexpected execution failure (default severity: error).
pub fn runtime_error(
    symbol: impl Into<String>,
    message: impl Into<String>,
) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::Runtime, symbol, message)
}

/// Business-rule violation (default severity: warning).
pub fn domain_error(
    symbol: impl Into<String>,
    message: impl Into<String>,
) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::Domain, symbol, message)
}

/// Infrastructure or resource failure (default severity: critical).
pub fn system_error(
    symbol: impl Into<String>,
    message: impl Into<String>,
) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::System, symbol, message)
}

/// Authentication or authorization failure (default severity: error).
pub fn auth_error(symbol: impl Into<String>, message: impl Into<String>) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::Auth, symbol, message)
}

/// External service or dependency failure (default severity: error).
pub fn external_error(
    symbol: impl Into<String>,
    message: impl Into<String>,
) -> EngineResult<ErrorRecord> {
    categorized(ErrorCategory::External, symbol, message)
}
