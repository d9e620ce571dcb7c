//! Seams to the services a batch run talks to.
//!
//! Implementations live outside this crate (HTTP clients, SDK wrappers, test
//! doubles). Every failure is reported as a [`ProviderFailure`] so the batch
//! driver can classify it uniformly.

use ticket_audit_core::TicketId;

use crate::classifier::ProviderFailure;
use crate::config::Credential;
use crate::result::AnalysisReport;
use crate::ticket::{HistoryItem, Ticket};

/// Fetches the ordered history (comments, updates) of a ticket.
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_history(&self, ticket_id: &TicketId) -> Result<Vec<HistoryItem>, ProviderFailure>;
}

/// Everything the analysis service needs for one ticket.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub ticket: &'a Ticket,
    pub history: &'a [HistoryItem],
    pub prompt: &'a str,
    pub model_id: &'a str,
    pub credential: &'a Credential,
}

/// Runs the AI quality analysis of a ticket.
#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<AnalysisReport, ProviderFailure>;

    /// Cheap credential check, run once before a batch starts.
    ///
    /// Lets invalid keys fail fast without spending any of the request budget
    /// on real tickets. The default accepts every credential.
    async fn probe(&self, _model_id: &str, _credential: &Credential) -> Result<(), ProviderFailure> {
        Ok(())
    }
}

/// Resolves the API key used for a run.
pub trait CredentialProvider: Send + Sync {
    /// An explicit override wins; otherwise fall back to ambient configuration.
    fn resolve(&self, override_credential: Option<&Credential>) -> Option<Credential>;
}

/// Builds the analysis prompt for a ticket and its history.
pub trait PromptBuilder: Send + Sync {
    fn build_prompt(&self, ticket: &Ticket, history: &[HistoryItem]) -> String;
}

impl<F> PromptBuilder for F
where
    F: Fn(&Ticket, &[HistoryItem]) -> String + Send + Sync,
{
    fn build_prompt(&self, ticket: &Ticket, history: &[HistoryItem]) -> String {
        self(ticket, history)
    }
}
