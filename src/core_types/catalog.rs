//! Read-only catalog of well-known symbols and their remediation hints.
//!
//! The tables are built once on first use and never mutated afterwards.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Well-known symbols shared by collaborators, hooks and collections.
pub mod symbols {
    // Data
    pub const INVALID_EMAIL: &str = "invalid_email";
    pub const REQUIRED_FIELD: &str = "required_field";
    pub const INVALID_FORMAT: &str = "invalid_format";
    pub const VALUE_OUT_OF_RANGE: &str = "value_out_of_range";
    pub const PARSE_ERROR: &str = "parse_error";
    pub const DATA_FETCH_FAILED: &str = "data_fetch_failed";

    // Runtime
    pub const UNEXPECTED_ERROR: &str = "unexpected_error";
    pub const NOT_FOUND: &str = "not_found";

    // Domain
    pub const BUSINESS_RULE_VIOLATION: &str = "business_rule_violation";
    pub const DUPLICATE: &str = "duplicate";

    // System
    pub const RESOURCE_EXHAUSTED: &str = "resource_exhausted";
    pub const INVALID_ERROR_DEFINITION: &str = "invalid_error_definition";
    pub const INVALID_CONFIGURATION: &str = "invalid_configuration";
    pub const MALFORMED_RECORD: &str = "malformed_record";

    // Auth
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const PERMISSION_DENIED: &str = "permission_denied";

    // External
    pub const TIMEOUT: &str = "timeout";
    pub const CONNECTION_FAILED: &str = "connection_failed";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";
    pub const CIRCUIT_OPEN: &str = "circuit_open";
}

/// Base URL for generated documentation links.
pub const HELP_URL_BASE: &str = "https://docs.structured-recovery.dev/errors";

static ERROR_SUGGESTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (symbols::INVALID_EMAIL, "Use a valid email address such as user@example.com"),
        (symbols::REQUIRED_FIELD, "Provide a value for this field"),
        (symbols::INVALID_FORMAT, "Check the value against the expected format"),
        (symbols::VALUE_OUT_OF_RANGE, "Use a value within the allowed range"),
        (symbols::PARSE_ERROR, "Check the input syntax"),
        (symbols::DATA_FETCH_FAILED, "Retry the request or use cached data"),
        (symbols::NOT_FOUND, "Check that the identifier is correct"),
        (symbols::DUPLICATE, "Use a different identifier or update the existing entry"),
        (symbols::RESOURCE_EXHAUSTED, "Free resources or raise the configured limits"),
        (symbols::UNAUTHORIZED, "Sign in again and retry"),
        (symbols::PERMISSION_DENIED, "Request access from an administrator"),
        (symbols::TIMEOUT, "Retry the operation or increase the timeout"),
        (symbols::CONNECTION_FAILED, "Check network connectivity and that the service is running"),
        (symbols::RATE_LIMITED, "Wait before retrying or reduce the request rate"),
        (symbols::SERVICE_UNAVAILABLE, "Retry later; the service may be down"),
        (symbols::CIRCUIT_OPEN, "Wait for the dependency to recover before retrying"),
    ])
});

/// Catalogued remediation hint for `symbol`, if there is one.
pub fn suggestion_for(symbol: &str) -> Option<&'static str> {
    ERROR_SUGGESTIONS.get(symbol).copied()
}

/// Documentation link for an error code (`data.invalid_email` → `.../data/invalid_email`).
pub fn help_url_for(error_code: &str) -> String {
    format!("{HELP_URL_BASE}/{}", error_code.replace('.', "/"))
}
