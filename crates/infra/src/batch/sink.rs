use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use ticket_audit_ai::AnalysisResult;
use ticket_audit_core::{AuditError, TicketId};

/// Receiver of every result a batch run emits, successful or synthetic.
///
/// Only the driver writes to a sink during a run; callers read from it.
pub trait ResultSink: Send + Sync {
    /// Called once before the first item of a run is dispatched.
    fn begin_run(&self) {}

    fn emit(&self, result: AnalysisResult);
}

/// How an [`InMemoryResultSink`] stores results.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkStrategy {
    /// One entry per ticket; re-analysing a ticket replaces its entry in place.
    #[default]
    KeyedUpsert,
    /// Every result in emission order; each run starts from an empty view.
    Append,
}

impl FromStr for SinkStrategy {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert" | "keyed" | "keyed_upsert" => Ok(SinkStrategy::KeyedUpsert),
            "append" => Ok(SinkStrategy::Append),
            other => Err(AuditError::validation(format!(
                "unknown sink strategy '{other}' (expected 'upsert' or 'append')"
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct SinkInner {
    results: Vec<AnalysisResult>,
    positions: HashMap<TicketId, usize>,
}

/// In-memory sink backing a live results view.
#[derive(Debug, Default)]
pub struct InMemoryResultSink {
    strategy: SinkStrategy,
    inner: Mutex<SinkInner>,
}

impl InMemoryResultSink {
    pub fn new(strategy: SinkStrategy) -> Self {
        Self {
            strategy,
            inner: Mutex::new(SinkInner::default()),
        }
    }

    pub fn keyed() -> Self {
        Self::new(SinkStrategy::KeyedUpsert)
    }

    pub fn append() -> Self {
        Self::new(SinkStrategy::Append)
    }

    pub fn strategy(&self) -> SinkStrategy {
        self.strategy
    }

    /// Snapshot of all stored results.
    ///
    /// Keyed sinks keep the order in which tickets were first seen.
    pub fn all(&self) -> Vec<AnalysisResult> {
        self.lock().results.clone()
    }

    /// Latest result for a ticket.
    pub fn get(&self, id: &TicketId) -> Option<AnalysisResult> {
        let inner = self.lock();
        match self.strategy {
            SinkStrategy::KeyedUpsert => inner.positions.get(id).map(|&i| inner.results[i].clone()),
            SinkStrategy::Append => inner.results.iter().rev().find(|r| &r.work_item_id == id).cloned(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.results.clear();
        inner.positions.clear();
    }

    fn lock(&self) -> MutexGuard<'_, SinkInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for InMemoryResultSink {
    fn begin_run(&self) {
        if self.strategy == SinkStrategy::Append {
            self.clear();
        }
    }

    fn emit(&self, result: AnalysisResult) {
        let mut inner = self.lock();
        match self.strategy {
            SinkStrategy::Append => inner.results.push(result),
            SinkStrategy::KeyedUpsert => {
                let existing = inner.positions.get(&result.work_item_id).copied();
                match existing {
                    Some(i) => inner.results[i] = result,
                    None => {
                        let i = inner.results.len();
                        inner.positions.insert(result.work_item_id.clone(), i);
                        inner.results.push(result);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_audit_ai::{AnalysisReport, ErrorClassification};

    fn ok(id: u64, summary: &str) -> AnalysisResult {
        AnalysisResult::from_report(
            TicketId::from(id),
            "m",
            AnalysisReport {
                summary: summary.to_string(),
                ..Default::default()
            },
        )
    }

    fn failed(id: u64) -> AnalysisResult {
        AnalysisResult::failed(TicketId::from(id), "m", ErrorClassification::Recoverable, "boom")
    }

    #[test]
    fn keyed_sink_overwrites_in_place() {
        let sink = InMemoryResultSink::keyed();
        sink.begin_run();
        sink.emit(ok(1, "first"));
        sink.emit(ok(2, "second"));

        sink.begin_run();
        sink.emit(failed(1));

        let all = sink.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].work_item_id, TicketId::from(1));
        assert!(all[0].is_failure());
        assert_eq!(all[1].summary, "second");
        assert!(sink.get(&TicketId::from(1)).unwrap().is_failure());
    }

    #[test]
    fn append_sink_keeps_every_result_and_resets_per_run() {
        let sink = InMemoryResultSink::append();
        sink.begin_run();
        sink.emit(ok(1, "a"));
        sink.emit(failed(1));
        sink.emit(ok(2, "b"));
        assert_eq!(sink.len(), 3);
        assert!(sink.get(&TicketId::from(1)).unwrap().is_failure());

        sink.begin_run();
        assert!(sink.is_empty());
        sink.emit(ok(3, "c"));
        assert_eq!(sink.all().len(), 1);
    }

    #[test]
    fn keyed_upsert_is_the_default() {
        assert_eq!(InMemoryResultSink::default().strategy(), SinkStrategy::KeyedUpsert);
        assert_eq!(SinkStrategy::default(), SinkStrategy::KeyedUpsert);
    }

    #[test]
    fn strategy_parses_from_config_strings() {
        assert_eq!("Append".parse::<SinkStrategy>().unwrap(), SinkStrategy::Append);
        assert_eq!("upsert".parse::<SinkStrategy>().unwrap(), SinkStrategy::KeyedUpsert);
        assert!("sideways".parse::<SinkStrategy>().is_err());
    }
}
