use tokio::sync::mpsc;

use ticket_audit_ai::{AnalysisResult, Progress};

/// Callbacks a run delivers to the calling application.
///
/// Invoked synchronously from the driver loop, after every item: first
/// `on_result`, then `on_progress`. Implementations should return quickly.
pub trait BatchObserver: Send + Sync {
    fn on_result(&self, _result: &AnalysisResult) {}

    fn on_progress(&self, _progress: Progress) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Event forwarded by a [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Result(AnalysisResult),
    Progress(Progress),
}

/// Forwards callbacks as messages, decoupling the driver from whatever
/// consumes them (a UI task, a websocket, a log writer).
///
/// Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<BatchEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl BatchObserver for ChannelObserver {
    fn on_result(&self, result: &AnalysisResult) {
        let _ = self.tx.send(BatchEvent::Result(result.clone()));
    }

    fn on_progress(&self, progress: Progress) {
        let _ = self.tx.send(BatchEvent::Progress(progress));
    }
}
