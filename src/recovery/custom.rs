//! Closure-backed recovery hooks.
//!
//! For one-off policies that do not warrant their own type. Anything
//! implementing [`RecoveryHook`] works just as well.

use std::fmt;
use std::sync::Arc;

use crate::core_types::ErrorRecord;
use crate::recovery::{RecoveryContext, RecoveryHook};

type Predicate = Arc<dyn Fn(&ErrorRecord, &RecoveryContext) -> bool + Send + Sync>;
type Action = Arc<dyn Fn(ErrorRecord, &mut RecoveryContext) -> Option<ErrorRecord> + Send + Sync>;

/// Hook assembled from a predicate and an action.
#[derive(Clone)]
pub struct CustomHook {
    name: String,
    predicate: Predicate,
    action: Action,
}

impl fmt::Debug for CustomHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHook").field("name", &self.name).finish_non_exhaustive()
    }
}

impl CustomHook {
    pub fn new<P, A>(name: impl Into<String>, predicate: P, action: A) -> Self
    where
        P: Fn(&ErrorRecord, &RecoveryContext) -> bool + Send + Sync + 'static,
        A: Fn(ErrorRecord, &mut RecoveryContext) -> Option<ErrorRecord> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            action: Arc::new(action),
        }
    }

    /// Hook applying to every error carrying `symbol`.
    pub fn for_symbol<A>(name: impl Into<String>, symbol: impl Into<String>, action: A) -> Self
    where
        A: Fn(ErrorRecord, &mut RecoveryContext) -> Option<ErrorRecord> + Send + Sync + 'static,
    {
        let symbol = symbol.into();
        Self::new(name, move |error, _| error.symbol() == symbol, action)
    }
}

impl RecoveryHook for CustomHook {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn should_recover(&self, error: &ErrorRecord, context: &RecoveryContext) -> bool {
        (self.predicate)(error, context)
    }

    fn recover(&self, error: ErrorRecord, context: &mut RecoveryContext) -> Option<ErrorRecord> {
        (self.action)(error, context)
    }
}
