//! Ordered, queryable aggregate of error records for one logical operation.
//!
//! Insertion order is preserved and is the order every query reports in.
//! Duplicates are kept. Reads never mutate the collection.
//!
//! # Example
//!
//! ```rust
//! use structured_recovery::{data_error, runtime_error, ErrorCollection, ErrorSeverity};
//!
//! # fn main() -> structured_recovery::EngineResult<()> {
//! let mut errors = ErrorCollection::new();
//! errors.add(data_error("invalid_email", "Email is invalid")?.at_path(["email"]));
//! errors.add(runtime_error("crashed", "Handler crashed")?.with_severity(ErrorSeverity::Critical));
//!
//! assert_eq!(errors.count(), 2);
//! assert_eq!(errors.most_severe().map(|e| e.symbol()), Some("crashed"));
//! assert_eq!(errors.summary().total, 2);
//! # Ok(())
//! # }
//! ```

use serde::{Serialize, Serializer};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::core_types::{join_path, ErrorCategory, ErrorRecord, ErrorSeverity, PathSegment};

/// Aggregate counts over a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub total: usize,
    /// Records flagged `is_fatal`, regardless of severity.
    pub fatal: usize,
    pub by_category: BTreeMap<ErrorCategory, usize>,
    pub by_severity: BTreeMap<ErrorSeverity, usize>,
    /// Records carrying a non-empty suggestion.
    pub has_suggestions: usize,
    pub most_severe: Option<ErrorSeverity>,
}

impl CollectionSummary {
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "total": self.total,
            "fatal": self.fatal,
            "by_category": self
                .by_category
                .iter()
                .map(|(category, count)| (category.to_string(), Value::from(*count)))
                .collect::<serde_json::Map<_, _>>(),
            "by_severity": self
                .by_severity
                .iter()
                .map(|(severity, count)| (severity.to_string(), Value::from(*count)))
                .collect::<serde_json::Map<_, _>>(),
            "has_suggestions": self.has_suggestions,
            "most_severe": self.most_severe.map(|s| s.to_string()),
        })
    }
}

/// Records produced during one operation, in first-seen order.
///
/// Owned by a single operation; not meant for concurrent writers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollection {
    errors: Vec<ErrorRecord>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn add(&mut self, record: ErrorRecord) {
        self.errors.push(record);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[ErrorRecord] {
        &self.errors
    }

    // =========================================================================
    // Filters
    // =========================================================================

    fn filter<'a>(&'a self, predicate: impl Fn(&ErrorRecord) -> bool) -> Vec<&'a ErrorRecord> {
        self.errors.iter().filter(|e| predicate(e)).collect()
    }

    /// Records whose path equals `path` exactly (no prefix matching).
    pub fn at_path(&self, path: &[PathSegment]) -> Vec<&ErrorRecord> {
        self.filter(|e| e.path() == path)
    }

    pub fn with_symbol(&self, symbol: &str) -> Vec<&ErrorRecord> {
        self.filter(|e| e.symbol() == symbol)
    }

    pub fn errors_in_category(&self, category: ErrorCategory) -> Vec<&ErrorRecord> {
        self.filter(|e| e.category() == category)
    }

    pub fn data_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::Data)
    }

    pub fn runtime_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::Runtime)
    }

    pub fn domain_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::Domain)
    }

    pub fn system_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::System)
    }

    pub fn auth_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::Auth)
    }

    pub fn external_errors(&self) -> Vec<&ErrorRecord> {
        self.errors_in_category(ErrorCategory::External)
    }

    /// Severity critical or fatal.
    pub fn critical_errors(&self) -> Vec<&ErrorRecord> {
        self.filter(|e| e.severity().is_critical())
    }

    /// Records flagged `is_fatal`.
    pub fn fatal_errors(&self) -> Vec<&ErrorRecord> {
        self.filter(ErrorRecord::is_fatal)
    }

    pub fn with_suggestions(&self) -> Vec<&ErrorRecord> {
        self.filter(ErrorRecord::has_suggestion)
    }

    // =========================================================================
    // Ordering and grouping
    // =========================================================================

    /// Most severe first; equal severities keep insertion order.
    pub fn sort_by_severity(&self) -> Vec<&ErrorRecord> {
        let mut sorted: Vec<&ErrorRecord> = self.errors.iter().collect();
        // sort_by is stable
        sorted.sort_by(|a, b| b.severity().cmp(&a.severity()));
        sorted
    }

    /// Highest severity; the first one wins a tie.
    pub fn most_severe(&self) -> Option<&ErrorRecord> {
        self.errors.iter().fold(None, |best, e| match best {
            Some(b) if b.severity() >= e.severity() => Some(b),
            _ => Some(e),
        })
    }

    /// Groups come out in the order their first record was added.
    pub fn group_by_path(&self) -> IndexMap<Vec<PathSegment>, Vec<&ErrorRecord>> {
        let mut groups: IndexMap<Vec<PathSegment>, Vec<&ErrorRecord>> = IndexMap::new();
        for error in &self.errors {
            groups.entry(error.path().to_vec()).or_default().push(error);
        }
        groups
    }

    pub fn group_by_category(&self) -> IndexMap<ErrorCategory, Vec<&ErrorRecord>> {
        let mut groups: IndexMap<ErrorCategory, Vec<&ErrorRecord>> = IndexMap::new();
        for error in &self.errors {
            groups.entry(error.category()).or_default().push(error);
        }
        groups
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub fn summary(&self) -> CollectionSummary {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for error in &self.errors {
            *by_category.entry(error.category()).or_insert(0) += 1;
            *by_severity.entry(error.severity()).or_insert(0) += 1;
        }

        CollectionSummary {
            total: self.errors.len(),
            fatal: self.errors.iter().filter(|e| e.is_fatal()).count(),
            by_category,
            by_severity,
            has_suggestions: self.errors.iter().filter(|e| e.has_suggestion()).count(),
            most_severe: self.most_severe().map(ErrorRecord::severity),
        }
    }

    /// `to_dict(false)` of every record, in order.
    pub fn to_list(&self) -> Vec<Value> {
        self.errors.iter().map(|e| e.to_dict(false)).collect()
    }

    /// Numbered plain-text report.
    ///
    /// ```text
    /// Errors:
    ///
    /// 1. 🔸 [email] Email is invalid
    ///    💡 Suggestion: Use user@example.com
    /// ```
    pub fn to_human_readable(&self, include_suggestions: bool) -> String {
        let mut lines = vec!["Errors:".to_string(), String::new()];
        for (index, error) in self.errors.iter().enumerate() {
            lines.push(format!(
                "{}. 🔸 [{}] {}",
                index + 1,
                join_path(error.path()),
                error.message()
            ));
            if include_suggestions {
                if let Some(suggestion) = error.suggestion().filter(|s| !s.is_empty()) {
                    lines.push(format!("   💡 Suggestion: {suggestion}"));
                }
            }
        }
        lines.join("\n")
    }
}

impl Serialize for ErrorCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_list().serialize(serializer)
    }
}

impl Extend<ErrorRecord> for ErrorCollection {
    fn extend<T: IntoIterator<Item = ErrorRecord>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ErrorRecord> for ErrorCollection {
    fn from_iter<T: IntoIterator<Item = ErrorRecord>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorCollection {
    type Item = ErrorRecord;
    type IntoIter = std::vec::IntoIter<ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a ErrorRecord;
    type IntoIter = std::slice::Iter<'a, ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
