//! Infrastructure layer: batch execution, result sinks, credentials, config.
//!
//! Wires the pure policies of `ticket-audit-ai` to a tokio runtime. The
//! ticketing and analysis clients themselves are supplied by the embedding
//! application through the provider traits.

pub mod batch;
pub mod config;
pub mod credentials;

pub use batch::{
    BatchDriver, BatchEvent, BatchObserver, BatchRunHandle, ChannelObserver, InMemoryResultSink,
    NoopObserver, ResultSink, SinkStrategy,
};
pub use config::AuditConfig;
pub use credentials::{EnvCredentialProvider, StaticCredentialProvider};
