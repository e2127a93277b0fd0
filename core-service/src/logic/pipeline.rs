//! Session Pipeline - runs a session behind an ordered single-consumer queue
//!
//! The inference producer pushes samples from any task; one worker task owns
//! the `ProctorSession` and processes commands strictly in send order.
//! UI pollers read a `SessionView` snapshot without touching the session.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::logic::config::EngineConfig;
use crate::logic::detection::RawSample;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::IncidentRecord;
use crate::logic::proof::ProofDigest;
use crate::logic::session::{ProctorSession, SessionState};

// ============================================================================
// SHARED VIEW
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    pub state: SessionState,
    pub score: u8,
    pub incidents: Vec<IncidentRecord>,
    pub samples_processed: u64,
}

/// Read-only handle for UI polling
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    inner: Arc<RwLock<ViewState>>,
}

impl SessionView {
    pub fn current_score(&self) -> u8 {
        self.inner.read().score
    }

    /// Last `n` incidents, most recent first
    pub fn recent_incidents(&self, n: usize) -> Vec<IncidentRecord> {
        self.inner.read().incidents.iter().rev().take(n).cloned().collect()
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.read().clone()
    }

    fn sync_from(&self, session: &ProctorSession) {
        let mut view = self.inner.write();
        let known = view.incidents.len();
        view.incidents.extend_from_slice(session.ledger().since(known));
        if session.ledger().len() < known {
            // Aborted: ledger discarded
            view.incidents.clear();
        }
        view.score = session.current_score();
        view.state = session.state();
        view.samples_processed = session.detection_count();
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeRequest {
    pub exam_id: String,
    pub subject_id: String,
    pub answers: Option<BTreeMap<String, String>>,
}

impl FinalizeRequest {
    pub fn new(exam_id: &str, subject_id: &str) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            subject_id: subject_id.to_string(),
            answers: None,
        }
    }
}

enum Command {
    Sample(RawSample),
    End(DateTime<Utc>, oneshot::Sender<EngineResult<()>>),
    Finalize(FinalizeRequest, oneshot::Sender<EngineResult<ProofDigest>>),
    Abort(oneshot::Sender<EngineResult<()>>),
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct SessionPipeline {
    tx: mpsc::UnboundedSender<Command>,
    view: SessionView,
    worker: JoinHandle<()>,
}

impl SessionPipeline {
    /// Start a session and spawn its worker on the current tokio runtime
    pub fn spawn(config: EngineConfig, started_at: DateTime<Utc>) -> EngineResult<Self> {
        let mut session = ProctorSession::new(config);
        session.start(started_at)?;

        let view = SessionView::default();
        view.sync_from(&session);

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(session, rx, view.clone()));

        Ok(Self { tx, view, worker })
    }

    pub fn view(&self) -> SessionView {
        self.view.clone()
    }

    /// Queue a sample. Per-sample problems are handled by the worker.
    pub fn push(&self, sample: RawSample) -> EngineResult<()> {
        self.send(Command::Sample(sample), "push sample")
    }

    pub async fn end(&self, at: DateTime<Utc>) -> EngineResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::End(at, reply), "end")?;
        self.await_reply(rx, "end").await
    }

    /// Finalize after every previously pushed sample has been processed
    pub async fn finalize(&self, request: FinalizeRequest) -> EngineResult<ProofDigest> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Finalize(request, reply), "finalize")?;
        self.await_reply(rx, "finalize").await
    }

    pub async fn abort(&self) -> EngineResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Abort(reply), "abort")?;
        self.await_reply(rx, "abort").await
    }

    /// Close the queue and wait for the worker to drain it
    pub async fn shutdown(self) -> SessionView {
        let Self { tx, view, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            log::error!("Session worker terminated abnormally: {}", e);
        }
        view
    }

    fn send(&self, command: Command, operation: &'static str) -> EngineResult<()> {
        self.tx
            .send(command)
            .map_err(|_| EngineError::invalid_state(operation, self.view.state()))
    }

    async fn await_reply<T>(
        &self,
        rx: oneshot::Receiver<EngineResult<T>>,
        operation: &'static str,
    ) -> EngineResult<T> {
        rx.await
            .map_err(|_| EngineError::invalid_state(operation, self.view.state()))?
    }
}

async fn run_worker(
    mut session: ProctorSession,
    mut rx: mpsc::UnboundedReceiver<Command>,
    view: SessionView,
) {
    log::debug!("Session worker {} started", session.id());

    while let Some(command) = rx.recv().await {
        match command {
            Command::Sample(raw) => {
                if session.push_raw(&raw) > 0 || session.detection_count() % 32 == 0 {
                    view.sync_from(&session);
                } else {
                    view.inner.write().samples_processed = session.detection_count();
                }
            }
            Command::End(at, reply) => {
                let result = session.end(at);
                view.sync_from(&session);
                let _ = reply.send(result);
            }
            Command::Finalize(request, reply) => {
                let result = session.finalize_with_answers(
                    &request.exam_id,
                    &request.subject_id,
                    request.answers,
                );
                view.sync_from(&session);
                let _ = reply.send(result);
            }
            Command::Abort(reply) => {
                let result = session.abort();
                view.sync_from(&session);
                let _ = reply.send(result);
            }
        }
    }

    log::debug!("Session worker {} stopped", session.id());
}
