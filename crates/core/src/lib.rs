//! `ticket-audit-core` — shared building blocks.
//!
//! Identifiers and the error model used by every other crate in the workspace.
//! Nothing here performs I/O.

pub mod error;
pub mod id;

pub use error::{AuditError, AuditResult};
pub use id::{RunId, TicketId};
