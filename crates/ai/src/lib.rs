//! `ticket-audit-ai`
//!
//! **Responsibility:** the runtime-agnostic core of ticket quality audits.
//!
//! - Data carried through a batch run (tickets, history, analysis results).
//! - Pure policies: failure classification and request throttling.
//! - The seams to external services (history fetch, analysis, credentials,
//!   prompt construction), expressed as traits.
//!
//! This crate performs no I/O and owns no runtime; the batch driver that ties
//! these pieces together lives in `ticket-audit-infra`.

pub mod classifier;
pub mod config;
pub mod provider;
pub mod result;
pub mod state;
pub mod throttle;
pub mod ticket;

pub use classifier::{ErrorClassification, FatalReason, ProviderFailure, classify};
pub use config::{BatchConfig, Credential, ItemLimit};
pub use provider::{
    AnalysisProvider, AnalysisRequest, CredentialProvider, HistoryProvider, PromptBuilder,
};
pub use result::{AnalysisFailure, AnalysisReport, AnalysisResult};
pub use state::{BatchState, BatchStatus, Progress, StopReason};
pub use throttle::{MIN_THROTTLE_INTERVAL, Throttle, throttle_interval};
pub use ticket::{HistoryItem, Ticket};
