//! Error model shared across the workspace.

use thiserror::Error;

/// Result type used across the audit crates.
pub type AuditResult<T> = Result<T, AuditError>;

/// Audit-level error.
///
/// Covers deterministic failures raised before or around a batch run
/// (validation, configuration). Failures coming back from the ticketing or
/// analysis services are not represented here; the batch driver turns those
/// into synthetic results instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// A value failed validation (e.g. zero requests per minute).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. empty ticket id).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A configuration value was missing or malformed.
    #[error("invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

impl AuditError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_key() {
        let err = AuditError::config("TICKET_AUDIT_RPM", "must be a positive integer");
        assert_eq!(
            err.to_string(),
            "invalid configuration for TICKET_AUDIT_RPM: must be a positive integer"
        );
    }
}
