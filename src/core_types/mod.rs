//! Core data model for structured errors
//!
//! ## Organization
//! - `category` - Closed category set and ordered severity scale
//! - `record` - The error record, its path segments and category constructors
//! - `catalog` - Read-only symbol and suggestion tables

pub mod catalog;
pub mod category;
pub mod record;

// Re-export commonly used types
pub use catalog::{help_url_for, suggestion_for, symbols};
pub use category::{ErrorCategory, ErrorSeverity};
pub use record::{
    auth_error, data_error, domain_error, external_error, join_path, runtime_error,
    system_error, ErrorRecord, PathSegment,
};
