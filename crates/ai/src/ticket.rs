use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use ticket_audit_core::TicketId;

/// A unit of work in a batch: one support ticket.
///
/// Carries just enough to request the ticket's history and to build an
/// analysis prompt. Immutable once a batch starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,

    /// Free-form fields from the ticketing API (status, priority, assignee, ...).
    #[serde(default)]
    pub metadata: JsonValue,
}

impl Ticket {
    pub fn new(id: TicketId, subject: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            metadata: JsonValue::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One entry of a ticket's history (comment, status change, field update).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub author: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,

    /// Whether the entry was visible to the requester.
    #[serde(default)]
    pub public: bool,
}

impl HistoryItem {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            created_at: None,
            public: true,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn internal(mut self) -> Self {
        self.public = false;
        self
    }
}
