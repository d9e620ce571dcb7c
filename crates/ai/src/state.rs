use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticket_audit_core::{RunId, TicketId};

use crate::classifier::FatalReason;

/// Why a run ended before processing every item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    AuthFailed,
    RateLimited,
    /// The run task itself failed (a provider panicked).
    Aborted,
}

impl From<FatalReason> for StopReason {
    fn from(reason: FatalReason) -> Self {
        match reason {
            FatalReason::AuthFailed => StopReason::AuthFailed,
            FatalReason::RateLimited => StopReason::RateLimited,
        }
    }
}

impl core::fmt::Display for StopReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::AuthFailed => f.write_str("auth_failed"),
            StopReason::RateLimited => f.write_str("rate_limited"),
            StopReason::Aborted => f.write_str("aborted"),
        }
    }
}

/// Lifecycle of a batch run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BatchStatus {
    Idle,
    Running,
    Stopped(StopReason),
    Completed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Stopped(_) | BatchStatus::Completed)
    }
}

/// Progress as shown to a caller: `processed` of `total`, and the item
/// currently (or most recently) being worked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub current: Option<TicketId>,
}

impl Progress {
    /// Completion ratio in `[0, 1]`; an empty batch counts as done.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }
}

/// State of one batch run.
///
/// Owned and mutated by the batch driver; callers only ever see snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchState {
    pub run_id: RunId,
    pub status: BatchStatus,
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub current_item: Option<TicketId>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchState {
    pub fn idle(run_id: RunId, total: usize) -> Self {
        Self {
            run_id,
            status: BatchStatus::Idle,
            processed: 0,
            total,
            succeeded: 0,
            failed: 0,
            current_item: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            processed: self.processed,
            total: self.total,
            current: self.current_item.clone(),
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.status {
            BatchStatus::Stopped(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn start(&mut self) {
        self.status = BatchStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn begin_item(&mut self, id: TicketId) {
        self.current_item = Some(id);
    }

    /// Count a finished item. Never exceeds `total`.
    pub fn record(&mut self, succeeded: bool) {
        debug_assert!(self.processed < self.total, "processed more items than scheduled");
        self.processed = (self.processed + 1).min(self.total);
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn stop(&mut self, reason: StopReason) {
        self.status = BatchStatus::Stopped(reason);
        self.finished_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = BatchStatus::Completed;
        self.finished_at = Some(Utc::now());
    }
}
