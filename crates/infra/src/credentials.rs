//! Credential resolution for the analysis service.

use ticket_audit_ai::{Credential, CredentialProvider};

/// Environment variable consulted when a run carries no explicit key.
pub const DEFAULT_API_KEY_VAR: &str = "TICKET_AUDIT_API_KEY";

/// Resolves the override first, then an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_VAR)
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(&self, override_credential: Option<&Credential>) -> Option<Credential> {
        if let Some(credential) = override_credential {
            return Some(credential.clone());
        }
        std::env::var(&self.var)
            .ok()
            .and_then(|key| Credential::new(key).ok())
    }
}

/// Fixed ambient credential (or none), for embedding applications that
/// manage keys themselves, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    ambient: Option<Credential>,
}

impl StaticCredentialProvider {
    pub fn new(ambient: Credential) -> Self {
        Self {
            ambient: Some(ambient),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn resolve(&self, override_credential: Option<&Credential>) -> Option<Credential> {
        override_credential.cloned().or_else(|| self.ambient.clone())
    }
}
