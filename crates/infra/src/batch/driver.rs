//! The batch control loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ticket_audit_ai::{
    AnalysisProvider, AnalysisReport, AnalysisRequest, AnalysisResult, BatchConfig, BatchState,
    Credential, CredentialProvider, ErrorClassification, HistoryProvider, PromptBuilder,
    ProviderFailure, StopReason, Throttle, Ticket,
};
use ticket_audit_core::RunId;

use super::observer::BatchObserver;
use super::sink::ResultSink;
use crate::credentials::EnvCredentialProvider;

/// Sequential driver for batch ticket analysis.
///
/// Per ticket: fetch history, build the prompt, call the analysis service,
/// classify any failure, record the result, then wait out the rest of the
/// throttle interval before the next ticket.
pub struct BatchDriver<H, A> {
    history: Arc<H>,
    analysis: Arc<A>,
    prompts: Arc<dyn PromptBuilder>,
    credentials: Arc<dyn CredentialProvider>,
}

impl<H, A> BatchDriver<H, A>
where
    H: HistoryProvider + 'static,
    A: AnalysisProvider + 'static,
{
    /// Create a driver that resolves credentials from the environment.
    pub fn new(history: Arc<H>, analysis: Arc<A>, prompts: impl PromptBuilder + 'static) -> Self {
        Self {
            history,
            analysis,
            prompts: Arc::new(prompts),
            credentials: Arc::new(EnvCredentialProvider::default()),
        }
    }

    pub fn with_credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    /// Run a batch to completion and return its terminal state.
    ///
    /// Never fails: service errors surface as synthetic results through
    /// `sink`/`observer` and as the final status. Setting `cancel` stops the
    /// run before the next ticket; a ticket already in flight still completes.
    pub async fn run<S, O>(
        &self,
        items: &[Ticket],
        config: &BatchConfig,
        sink: &S,
        observer: &O,
        cancel: &CancellationToken,
    ) -> BatchState
    where
        S: ResultSink + ?Sized,
        O: BatchObserver + ?Sized,
    {
        let total = config.item_limit.apply(items.len());
        let (state_tx, _) = watch::channel(BatchState::idle(RunId::new(), total));
        self.drive(items, config, sink, observer, cancel, &state_tx).await
    }

    /// Run a batch on the tokio runtime.
    ///
    /// The returned handle exposes state snapshots after every item and the
    /// cancellation signal.
    pub fn spawn<S, O>(
        self: Arc<Self>,
        items: Vec<Ticket>,
        config: BatchConfig,
        sink: Arc<S>,
        observer: Arc<O>,
    ) -> BatchRunHandle
    where
        S: ResultSink + 'static,
        O: BatchObserver + 'static,
    {
        let cancel = CancellationToken::new();
        let total = config.item_limit.apply(items.len());
        let (state_tx, state_rx) = watch::channel(BatchState::idle(RunId::new(), total));

        let token = cancel.clone();
        let join = tokio::spawn(async move {
            self.drive(&items, &config, sink.as_ref(), observer.as_ref(), &token, &state_tx)
                .await
        });

        BatchRunHandle {
            cancel,
            state: state_rx,
            join,
        }
    }

    async fn drive<S, O>(
        &self,
        items: &[Ticket],
        config: &BatchConfig,
        sink: &S,
        observer: &O,
        cancel: &CancellationToken,
        state_tx: &watch::Sender<BatchState>,
    ) -> BatchState
    where
        S: ResultSink + ?Sized,
        O: BatchObserver + ?Sized,
    {
        let items = &items[..config.item_limit.apply(items.len())];
        let throttle = Throttle::new(config.requests_per_minute);

        let mut state = state_tx.borrow().clone();
        let run_id = state.run_id;
        state.start();
        state_tx.send_replace(state.clone());
        sink.begin_run();

        info!(
            run_id = %run_id,
            total = items.len(),
            model = %config.model_id,
            rpm = config.requests_per_minute.get(),
            interval_ms = throttle.interval().as_millis() as u64,
            "batch run started"
        );

        if items.is_empty() {
            return finish(state, None, state_tx);
        }

        let credential = match self.authorize(run_id, config).await {
            Ok(credential) => credential,
            Err(reason) => return finish(state, Some(reason), state_tx),
        };

        for (index, ticket) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                return finish(state, Some(StopReason::Cancelled), state_tx);
            }

            state.begin_item(ticket.id.clone());
            state_tx.send_replace(state.clone());

            let started = Instant::now();
            let outcome = self.analyze_ticket(ticket, config, &credential).await;
            let elapsed = started.elapsed();

            let (result, classification) = match outcome {
                Ok(report) => (
                    AnalysisResult::from_report(ticket.id.clone(), &config.model_id, report),
                    None,
                ),
                Err(failure) => {
                    let classification = failure.classify();
                    warn!(
                        run_id = %run_id,
                        ticket = %ticket.id,
                        status = ?failure.status,
                        classification = %classification,
                        error = %failure,
                        "ticket analysis failed"
                    );
                    let result = AnalysisResult::failed(
                        ticket.id.clone(),
                        &config.model_id,
                        classification,
                        failure.message,
                    );
                    (result, Some(classification))
                }
            };

            state.record(classification.is_none());
            sink.emit(result.clone());
            observer.on_result(&result);
            observer.on_progress(state.progress());
            state_tx.send_replace(state.clone());

            if let Some(reason) = classification.and_then(|c| c.fatal_reason()) {
                return finish(state, Some(reason.into()), state_tx);
            }

            let is_last = index + 1 == items.len();
            if is_last || cancel.is_cancelled() {
                continue;
            }

            let wait = throttle.wait_after(elapsed);
            if !wait.is_zero() {
                debug!(
                    run_id = %run_id,
                    wait_ms = wait.as_millis() as u64,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "throttling before next ticket"
                );
                tokio::select! {
                    _ = sleep(wait) => {}
                    _ = cancel.cancelled() => {
                        debug!(run_id = %run_id, "throttle wait cut short by cancellation");
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            return finish(state, Some(StopReason::Cancelled), state_tx);
        }
        finish(state, None, state_tx)
    }

    /// Resolve the credential and probe it once before any ticket is sent.
    async fn authorize(&self, run_id: RunId, config: &BatchConfig) -> Result<Credential, StopReason> {
        let Some(credential) = self.credentials.resolve(config.credential_override.as_ref()) else {
            warn!(run_id = %run_id, "no API key configured for analysis");
            return Err(StopReason::AuthFailed);
        };

        match self.analysis.probe(&config.model_id, &credential).await {
            Ok(()) => Ok(credential),
            Err(failure) => match failure.classify() {
                ErrorClassification::Fatal(reason) => {
                    warn!(run_id = %run_id, reason = %reason, error = %failure, "credential probe rejected");
                    Err(reason.into())
                }
                ErrorClassification::Recoverable => {
                    warn!(run_id = %run_id, error = %failure, "credential probe inconclusive; continuing");
                    Ok(credential)
                }
            },
        }
    }

    async fn analyze_ticket(
        &self,
        ticket: &Ticket,
        config: &BatchConfig,
        credential: &Credential,
    ) -> Result<AnalysisReport, ProviderFailure> {
        let history = self.history.fetch_history(&ticket.id).await?;
        let prompt = self.prompts.build_prompt(ticket, &history);

        let report = self
            .analysis
            .analyze(AnalysisRequest {
                ticket,
                history: &history,
                prompt: &prompt,
                model_id: &config.model_id,
                credential,
            })
            .await?;

        if report.is_empty() {
            return Err(ProviderFailure::message("analysis returned an empty assessment"));
        }
        Ok(report)
    }
}

fn finish(
    mut state: BatchState,
    stopped: Option<StopReason>,
    state_tx: &watch::Sender<BatchState>,
) -> BatchState {
    match stopped {
        Some(reason) => state.stop(reason),
        None => state.complete(),
    }

    info!(
        run_id = %state.run_id,
        status = ?state.status,
        processed = state.processed,
        total = state.total,
        succeeded = state.succeeded,
        failed = state.failed,
        "batch run finished"
    );

    state_tx.send_replace(state.clone());
    state
}

/// Handle to a batch run started with [`BatchDriver::spawn`].
#[derive(Debug)]
pub struct BatchRunHandle {
    cancel: CancellationToken,
    state: watch::Receiver<BatchState>,
    join: JoinHandle<BatchState>,
}

impl BatchRunHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Latest state snapshot.
    pub fn state(&self) -> BatchState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state.clone()
    }

    /// Wait for the run to finish.
    ///
    /// If the run task panicked (a misbehaving provider), the last published
    /// snapshot is returned, marked `Stopped(Aborted)`.
    pub async fn join(self) -> BatchState {
        let BatchRunHandle { state, join, .. } = self;
        match join.await {
            Ok(final_state) => final_state,
            Err(e) => {
                let mut last = state.borrow().clone();
                error!(run_id = %last.run_id, error = %e, "batch run task failed");
                if !last.status.is_terminal() {
                    last.stop(StopReason::Aborted);
                }
                last
            }
        }
    }
}
