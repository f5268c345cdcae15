//! Substitute results for failed operations.
//!
//! The hook writes its value into `context["fallback_result"]` and reports the
//! error as recovered. A fallback function may itself fail; the error is then
//! handed on unchanged with the reason under `context["fallback_error"]`.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::core_types::ErrorRecord;
use crate::logging::{log_debug, log_warn};
use crate::recovery::{context_keys, RecoveryContext, RecoveryHook};

type FallbackFn = Arc<dyn Fn(&ErrorRecord, &RecoveryContext) -> anyhow::Result<Value> + Send + Sync>;

/// Where the substitute result comes from.
#[derive(Clone)]
pub enum FallbackSource {
    /// Same value every time.
    Value(Value),
    /// Computed from the error and the context.
    Function(FallbackFn),
}

impl fmt::Debug for FallbackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Hook that substitutes a result for errors with an applicable symbol.
#[derive(Debug, Clone)]
pub struct FallbackHook {
    source: FallbackSource,
    applicable_symbols: BTreeSet<String>,
}

impl FallbackHook {
    /// Fallback to a static value.
    pub fn with_value<I, S>(value: impl Into<Value>, applicable_symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: FallbackSource::Value(value.into()),
            applicable_symbols: applicable_symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Fallback computed by `fallback_fn`.
    pub fn with_fn<F, I, S>(fallback_fn: F, applicable_symbols: I) -> Self
    where
        F: Fn(&ErrorRecord, &RecoveryContext) -> anyhow::Result<Value> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: FallbackSource::Function(Arc::new(fallback_fn)),
            applicable_symbols: applicable_symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn source(&self) -> &FallbackSource {
        &self.source
    }

    pub fn applicable_symbols(&self) -> &BTreeSet<String> {
        &self.applicable_symbols
    }
}

impl RecoveryHook for FallbackHook {
    fn name(&self) -> String {
        "fallback".to_string()
    }

    fn should_recover(&self, error: &ErrorRecord, _context: &RecoveryContext) -> bool {
        self.applicable_symbols.contains(error.symbol())
    }

    fn recover(&self, error: ErrorRecord, context: &mut RecoveryContext) -> Option<ErrorRecord> {
        let value = match &self.source {
            FallbackSource::Value(value) => value.clone(),
            FallbackSource::Function(fallback_fn) => match fallback_fn(&error, context) {
                Ok(value) => value,
                Err(e) => {
                    log_warn!(
                        error_code = %error.error_code(),
                        fallback_error = %e,
                        "Fallback function failed"
                    );
                    context.insert(context_keys::FALLBACK_ERROR.into(), Value::String(e.to_string()));
                    return Some(error);
                }
            },
        };

        log_debug!(error_code = %error.error_code(), "Fallback result substituted");
        context.insert(context_keys::FALLBACK_RESULT.into(), value);
        None
    }
}
