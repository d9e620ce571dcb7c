//! Configuration loading from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `TICKET_AUDIT_MODEL` | `gemini-2.0-flash` | analysis model id |
//! | `TICKET_AUDIT_RPM` | `15` | requests per minute (>= 1) |
//! | `TICKET_AUDIT_ITEM_LIMIT` | `all` | `all` or a positive item count |
//! | `TICKET_AUDIT_SINK` | `upsert` | `upsert` or `append` |
//!
//! The API key itself is resolved at run time by the credential provider.

use std::num::NonZeroUsize;

use tracing::debug;

use ticket_audit_ai::{BatchConfig, ItemLimit};
use ticket_audit_core::{AuditError, AuditResult};

use crate::batch::SinkStrategy;

pub const MODEL_VAR: &str = "TICKET_AUDIT_MODEL";
pub const RPM_VAR: &str = "TICKET_AUDIT_RPM";
pub const ITEM_LIMIT_VAR: &str = "TICKET_AUDIT_ITEM_LIMIT";
pub const SINK_VAR: &str = "TICKET_AUDIT_SINK";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_RPM: u32 = 15;

/// Settings for batch audits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    pub batch: BatchConfig,
    pub sink_strategy: SinkStrategy,
}

impl AuditConfig {
    pub fn from_env() -> AuditResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, config map, tests).
    pub fn from_lookup<F>(lookup: F) -> AuditResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let model = value(MODEL_VAR).unwrap_or_else(|| {
            debug!(fallback = DEFAULT_MODEL, "{MODEL_VAR} not set; using default");
            DEFAULT_MODEL.to_string()
        });

        let rpm = match value(RPM_VAR) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|&n| n >= 1)
                .ok_or_else(|| AuditError::config(RPM_VAR, format!("expected a positive integer, got '{raw}'")))?,
            None => {
                debug!(fallback = DEFAULT_RPM, "{RPM_VAR} not set; using default");
                DEFAULT_RPM
            }
        };

        let item_limit = match value(ITEM_LIMIT_VAR) {
            Some(raw) => parse_item_limit(&raw)?,
            None => ItemLimit::All,
        };

        let sink_strategy = match value(SINK_VAR) {
            Some(raw) => raw
                .parse::<SinkStrategy>()
                .map_err(|e| AuditError::config(SINK_VAR, e.to_string()))?,
            None => SinkStrategy::default(),
        };

        let batch = BatchConfig::new(model, rpm)
            .map_err(|e| AuditError::config(MODEL_VAR, e.to_string()))?
            .with_item_limit(item_limit);

        Ok(Self {
            batch,
            sink_strategy,
        })
    }
}

fn parse_item_limit(raw: &str) -> AuditResult<ItemLimit> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(ItemLimit::All);
    }
    raw.parse::<NonZeroUsize>()
        .map(ItemLimit::First)
        .map_err(|_| AuditError::config(ITEM_LIMIT_VAR, format!("expected 'all' or a positive integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> AuditResult<AuditConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuditConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.batch.model_id, DEFAULT_MODEL);
        assert_eq!(config.batch.requests_per_minute.get(), DEFAULT_RPM);
        assert_eq!(config.batch.item_limit, ItemLimit::All);
        assert_eq!(config.batch.credential_override, None);
        assert_eq!(config.sink_strategy, SinkStrategy::KeyedUpsert);
    }

    #[test]
    fn explicit_values_are_used() {
        let config = load(&[
            (MODEL_VAR, "gemini-1.5-pro"),
            (RPM_VAR, "30"),
            (ITEM_LIMIT_VAR, "5"),
            (SINK_VAR, "append"),
        ])
        .unwrap();
        assert_eq!(config.batch.model_id, "gemini-1.5-pro");
        assert_eq!(config.batch.requests_per_minute.get(), 30);
        assert_eq!(
            config.batch.item_limit,
            ItemLimit::First(NonZeroUsize::new(5).unwrap())
        );
        assert_eq!(config.sink_strategy, SinkStrategy::Append);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[(MODEL_VAR, "  "), (RPM_VAR, "")]).unwrap();
        assert_eq!(config.batch.model_id, DEFAULT_MODEL);
        assert_eq!(config.batch.requests_per_minute.get(), DEFAULT_RPM);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for (key, raw) in [
            (RPM_VAR, "0"),
            (RPM_VAR, "fast"),
            (ITEM_LIMIT_VAR, "0"),
            (ITEM_LIMIT_VAR, "some"),
            (SINK_VAR, "sideways"),
        ] {
            match load(&[(key, raw)]) {
                Err(AuditError::Config { key: k, .. }) => assert_eq!(k, key),
                other => panic!("{key}={raw} gave {other:?}"),
            }
        }
    }
}
