//! Conversion of platform-native failures into error records.
//!
//! Native failures carry no category or symbol, so classification goes through
//! an [`ExceptionMapper`]: an ordered table of message patterns, each naming
//! the category and symbol a matching failure should get. The first matching
//! rule wins; unmatched failures become `runtime.unexpected_error`.
//!
//! The `source()` chain of the native failure becomes the record's cause chain.
//!
//! ```rust
//! use structured_recovery::{ErrorCategory, ErrorRecord};
//!
//! let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "operation timed out");
//! let record = ErrorRecord::from_exception(&io, None, None);
//!
//! assert_eq!(record.error_code(), "external.timeout");
//! assert_eq!(record.message(), "operation timed out");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core_types::{symbols, ErrorCategory, ErrorRecord, ErrorSeverity};
use crate::error::{EngineError, EngineResult};
use crate::logging::log_debug;

/// One row of the lookup table.
#[derive(Debug, Clone)]
pub struct MappingRule {
    pattern: Regex,
    category: ErrorCategory,
    symbol: String,
    severity: Option<ErrorSeverity>,
}

impl MappingRule {
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationError`] if `pattern` is not a valid
    /// regex, or [`EngineError::InvalidErrorDefinition`] if `symbol` is empty.
    pub fn new(
        pattern: &str,
        category: ErrorCategory,
        symbol: impl Into<String>,
    ) -> EngineResult<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(EngineError::invalid_definition(format!(
                "Mapping rule '{pattern}' requires a non-empty symbol"
            )));
        }
        let pattern = Regex::new(pattern).map_err(|e| {
            EngineError::configuration_error(format!("Invalid mapping pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern,
            category,
            symbol,
            severity: None,
        })
    }

    /// Override the category's default severity for matches.
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

/// Ordered lookup table from failure messages to category and symbol.
#[derive(Debug, Clone, Default)]
pub struct ExceptionMapper {
    rules: Vec<MappingRule>,
}

/// Built-in rules covering the common transport and I/O failures.
pub static DEFAULT_MAPPER: Lazy<ExceptionMapper> = Lazy::new(ExceptionMapper::with_defaults);

impl ExceptionMapper {
    /// An empty table: everything maps to the fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-loaded with the built-in rules.
    pub fn with_defaults() -> Self {
        let defaults: [(&str, ErrorCategory, &str); 8] = [
            (r"(?i)timed?\s*out|deadline exceeded", ErrorCategory::External, symbols::TIMEOUT),
            (
                r"(?i)connection (refused|reset|aborted|closed)|broken pipe",
                ErrorCategory::External,
                symbols::CONNECTION_FAILED,
            ),
            (r"(?i)rate limit|too many requests", ErrorCategory::External, symbols::RATE_LIMITED),
            (r"(?i)permission denied|forbidden", ErrorCategory::Auth, symbols::PERMISSION_DENIED),
            (r"(?i)unauthori[sz]ed|invalid credentials", ErrorCategory::Auth, symbols::UNAUTHORIZED),
            (r"(?i)not found|no such file", ErrorCategory::Runtime, symbols::NOT_FOUND),
            (
                r"(?i)invalid (digit|float|type)|parse|expected .* at line",
                ErrorCategory::Data,
                symbols::PARSE_ERROR,
            ),
            (
                r"(?i)out of memory|no space left|too many open files",
                ErrorCategory::System,
                symbols::RESOURCE_EXHAUSTED,
            ),
        ];

        let rules = defaults
            .into_iter()
            .filter_map(|(pattern, category, symbol)| {
                MappingRule::new(pattern, category, symbol).ok()
            })
            .collect();
        Self { rules }
    }

    /// Append a rule; earlier rules take precedence.
    pub fn add_rule(&mut self, rule: MappingRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Insert a rule ahead of all existing ones.
    pub fn prepend_rule(&mut self, rule: MappingRule) -> &mut Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// First rule matching `message`.
    pub fn classify(&self, message: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|rule| rule.matches(message))
    }

    /// Convert a native failure and its `source()` chain.
    ///
    /// An explicit `symbol` or `category` overrides what the table says.
    /// Without a rule or override the category is `runtime` and the symbol
    /// `unexpected_error`.
    pub fn convert(
        &self,
        failure: &(dyn std::error::Error + 'static),
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        let mut messages = Vec::new();
        let mut current = Some(failure);
        while let Some(err) = current {
            messages.push(err.to_string());
            current = err.source();
        }
        self.convert_chain(&messages, symbol, category)
    }

    /// Convert an [`anyhow::Error`], using its context chain as the cause chain.
    pub fn convert_anyhow(
        &self,
        failure: &anyhow::Error,
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        let messages: Vec<String> = failure.chain().map(ToString::to_string).collect();
        self.convert_chain(&messages, symbol, category)
    }

    /// `messages[0]` is the outermost failure; later entries are its causes.
    fn convert_chain(
        &self,
        messages: &[String],
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        // Build from the root outwards so each record owns its cause.
        let mut cause: Option<ErrorRecord> = None;
        for (depth, message) in messages.iter().enumerate().rev() {
            let (overrides_symbol, overrides_category) = if depth == 0 {
                (symbol, category)
            } else {
                (None, None)
            };
            let mut record = self.convert_message(message, overrides_symbol, overrides_category);
            if let Some(inner) = cause.take() {
                record = record.with_cause(inner);
            }
            cause = Some(record);
        }

        cause.unwrap_or_else(|| self.convert_message("Unknown failure", symbol, category))
    }

    fn convert_message(
        &self,
        message: &str,
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        let rule = self.classify(message);
        let resolved_category = category
            .or_else(|| rule.map(|r| r.category))
            .unwrap_or(ErrorCategory::Runtime);
        let resolved_symbol = symbol
            .filter(|s| !s.trim().is_empty())
            .or_else(|| rule.map(|r| r.symbol.as_str()))
            .unwrap_or(symbols::UNEXPECTED_ERROR);
        let message = if message.trim().is_empty() {
            "Unknown failure"
        } else {
            message
        };

        log_debug!(
            symbol = %resolved_symbol,
            category = %resolved_category,
            matched_rule = rule.is_some(),
            "Converting native failure to error record"
        );

        let severity = rule
            .and_then(|r| r.severity)
            .unwrap_or_else(|| resolved_category.default_severity());
        ErrorRecord::from_parts(resolved_category, resolved_symbol, message).with_severity(severity)
    }
}

impl ErrorRecord {
    /// Convert a native failure with the built-in [`DEFAULT_MAPPER`].
    ///
    /// The failure's message becomes the record's message; its `source()`
    /// chain becomes the cause chain.
    pub fn from_exception(
        failure: &(dyn std::error::Error + 'static),
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        DEFAULT_MAPPER.convert(failure, symbol, category)
    }

    /// [`from_exception`](Self::from_exception) for [`anyhow::Error`].
    pub fn from_anyhow(
        failure: &anyhow::Error,
        symbol: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> ErrorRecord {
        DEFAULT_MAPPER.convert_anyhow(failure, symbol, category)
    }
}
