//! Failure classification for batch items.
//!
//! Neither the ticketing API nor the analysis service reports errors in one
//! uniform shape: one may return an HTTP status, the other only a message such
//! as `"RESOURCE_EXHAUSTED: quota exceeded"`. Every failure is therefore reduced
//! to a [`ProviderFailure`] (optional status + message) and classified here, in
//! one place, instead of at each call site.
//!
//! Rules, checked in order (message matching is case-insensitive):
//!
//! 1. status `401`, or the message mentions `api key` / `unauthorized`
//!    → [`FatalReason::AuthFailed`]
//! 2. status `429`, or the message mentions `quota`, `rate limit`,
//!    `too many requests`, `resource exhausted` or the gRPC status name
//!    `resource_exhausted` → [`FatalReason::RateLimited`]
//! 3. anything else → [`ErrorClassification::Recoverable`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

const AUTH_MARKERS: &[&str] = &["api key", "unauthorized"];
const RATE_LIMIT_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "too many requests",
    "resource exhausted",
    "resource_exhausted",
];

/// A failure reported by the history or analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderFailure {
    /// HTTP (or HTTP-equivalent) status code, when the service reported one.
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Failure with a status code (e.g. an HTTP error response).
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    /// Failure described only by a message (transport errors, SDK errors).
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn classify(&self) -> ErrorClassification {
        classify(self.status, &self.message)
    }
}

/// Why a batch must stop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalReason {
    /// Credentials were rejected.
    AuthFailed,
    /// The account hit its quota or rate limit.
    RateLimited,
}

impl core::fmt::Display for FatalReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FatalReason::AuthFailed => f.write_str("auth_failed"),
            FatalReason::RateLimited => f.write_str("rate_limited"),
        }
    }
}

/// Severity of a per-item failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ErrorClassification {
    /// Account-level failure: no further items may be dispatched.
    Fatal(FatalReason),
    /// Only the current item failed.
    Recoverable,
}

impl ErrorClassification {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorClassification::Fatal(_))
    }

    pub fn fatal_reason(&self) -> Option<FatalReason> {
        match self {
            ErrorClassification::Fatal(reason) => Some(*reason),
            ErrorClassification::Recoverable => None,
        }
    }
}

impl core::fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorClassification::Fatal(reason) => write!(f, "fatal({reason})"),
            ErrorClassification::Recoverable => f.write_str("recoverable"),
        }
    }
}

/// Classify a failure signal. Pure and total.
pub fn classify(status: Option<u16>, message: &str) -> ErrorClassification {
    let normalized = message.to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|m| normalized.contains(m));

    if status == Some(401) || mentions(AUTH_MARKERS) {
        return ErrorClassification::Fatal(FatalReason::AuthFailed);
    }

    if status == Some(429) || mentions(RATE_LIMIT_MARKERS) {
        return ErrorClassification::Fatal(FatalReason::RateLimited);
    }

    ErrorClassification::Recoverable
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const AUTH: ErrorClassification = ErrorClassification::Fatal(FatalReason::AuthFailed);
    const RATE: ErrorClassification = ErrorClassification::Fatal(FatalReason::RateLimited);

    #[test]
    fn status_codes_drive_classification() {
        assert_eq!(classify(Some(401), ""), AUTH);
        assert_eq!(classify(Some(429), "quota exceeded"), RATE);
        assert_eq!(classify(Some(429), ""), RATE);
        assert_eq!(classify(Some(500), "boom"), ErrorClassification::Recoverable);
        assert_eq!(classify(Some(404), "ticket not found"), ErrorClassification::Recoverable);
    }

    #[test]
    fn messages_drive_classification_without_status() {
        assert_eq!(classify(None, "Invalid API key"), AUTH);
        assert_eq!(classify(None, "401 Unauthorized"), AUTH);
        assert_eq!(classify(None, "Quota exceeded for model"), RATE);
        assert_eq!(classify(None, "Rate limit reached"), RATE);
        assert_eq!(classify(None, "Too Many Requests"), RATE);
        assert_eq!(classify(None, "RESOURCE_EXHAUSTED"), RATE);
        assert_eq!(classify(None, "connection reset by peer"), ErrorClassification::Recoverable);
        assert_eq!(classify(None, ""), ErrorClassification::Recoverable);
    }

    #[test]
    fn underscored_field_names_are_not_markers() {
        assert_eq!(
            classify(Some(400), "missing required field api_key in request body"),
            ErrorClassification::Recoverable
        );
        assert_eq!(
            classify(Some(500), "invalid config: rate_limit_window"),
            ErrorClassification::Recoverable
        );
    }

    #[test]
    fn fatal_reason_is_exposed_only_for_fatal_classes() {
        assert_eq!(RATE.fatal_reason(), Some(FatalReason::RateLimited));
        assert_eq!(ErrorClassification::Recoverable.fatal_reason(), None);
    }

    #[test]
    fn auth_rule_wins_over_rate_limit_rule() {
        assert_eq!(classify(Some(429), "api key revoked"), AUTH);
        assert_eq!(classify(Some(401), "quota exceeded"), AUTH);
    }

    #[test]
    fn provider_failure_displays_its_message() {
        let failure = ProviderFailure::with_status(503, "upstream unavailable");
        assert_eq!(failure.to_string(), "upstream unavailable");
        assert_eq!(failure.classify(), ErrorClassification::Recoverable);
    }

    #[test]
    fn classification_serializes_with_reason() {
        let json = serde_json::to_value(RATE).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "fatal", "reason": "rate_limited" }));
    }

    proptest! {
        #[test]
        fn status_401_is_always_auth_failure(message in ".*") {
            prop_assert_eq!(classify(Some(401), &message), AUTH);
        }

        #[test]
        fn status_429_is_never_recoverable(message in ".*") {
            prop_assert!(classify(Some(429), &message).is_fatal());
        }

        #[test]
        fn lowercase_alphanumeric_noise_is_recoverable(
            status in prop::option::of(500u16..600),
            message in "[b-j0-9]{0,40}",
        ) {
            // None of the markers can be spelled from this alphabet.
            prop_assert_eq!(classify(status, &message), ErrorClassification::Recoverable);
        }

        #[test]
        fn classification_ignores_case(message in "(quota|api key|unauthorized|rate limit)") {
            prop_assert_eq!(
                classify(None, &message),
                classify(None, &message.to_uppercase())
            );
        }
    }
}
