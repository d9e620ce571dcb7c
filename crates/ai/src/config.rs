use std::num::{NonZeroU32, NonZeroUsize};

use serde::{Deserialize, Serialize};

use ticket_audit_core::{AuditError, AuditResult};

/// An API key for the analysis service.
///
/// `Debug` is redacted so keys never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> AuditResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AuditError::validation("credential must not be blank"));
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// How many of the supplied tickets a run processes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLimit {
    #[default]
    All,
    First(NonZeroUsize),
}

impl ItemLimit {
    /// Number of items a run over `available` tickets will dispatch.
    pub fn apply(&self, available: usize) -> usize {
        match self {
            ItemLimit::All => available,
            ItemLimit::First(n) => available.min(n.get()),
        }
    }
}

/// Configuration for one batch run. Immutable while the run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub model_id: String,
    pub requests_per_minute: NonZeroU32,

    /// Takes precedence over the ambient credential when set.
    #[serde(skip)]
    pub credential_override: Option<Credential>,

    #[serde(default)]
    pub item_limit: ItemLimit,
}

impl BatchConfig {
    pub fn new(model_id: impl Into<String>, requests_per_minute: u32) -> AuditResult<Self> {
        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(AuditError::validation("model id must not be blank"));
        }

        let requests_per_minute = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| AuditError::validation("requests per minute must be >= 1"))?;

        Ok(Self {
            model_id,
            requests_per_minute,
            credential_override: None,
            item_limit: ItemLimit::All,
        })
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential_override = Some(credential);
        self
    }

    pub fn with_item_limit(mut self, item_limit: ItemLimit) -> Self {
        self.item_limit = item_limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rpm_is_rejected() {
        assert!(matches!(
            BatchConfig::new("gemini-2.0-flash", 0),
            Err(AuditError::Validation(_))
        ));
    }

    #[test]
    fn blank_model_is_rejected() {
        assert!(BatchConfig::new(" ", 10).is_err());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let config = BatchConfig::new("m", 10)
            .unwrap()
            .with_credential(Credential::new("sk-secret").unwrap());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("Credential(***)"));
    }

    #[test]
    fn item_limit_caps_the_batch() {
        assert_eq!(ItemLimit::All.apply(7), 7);
        let first_three = ItemLimit::First(NonZeroUsize::new(3).unwrap());
        assert_eq!(first_three.apply(7), 3);
        assert_eq!(first_three.apply(2), 2);
    }

    #[test]
    fn serialized_config_omits_credential() {
        let config = BatchConfig::new("m", 10)
            .unwrap()
            .with_credential(Credential::new("sk-secret").unwrap());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
