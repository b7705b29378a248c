use super::session::{SessionKind, StreamSession};
use crate::api::{ApiClient, ByteStream};
use crate::config::Config;
use crate::error::{ExchangeError, TransportError};
use crate::state::{ExchangeSnapshot, ExchangeState};
use crate::types::{ApprovalDecision, EventRecord};
use tokio::sync::watch;
use uuid::Uuid;

pub const REFRESH_PROMPT: &str = "Scan infrastructure status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A `final` record arrived and nothing is waiting on the user.
    Completed,
    /// The backend paused; call `Exchange::resume` with a decision.
    AwaitingApproval,
    /// The stream ended without any terminal record.
    Closed,
}

/// Drives stream sessions against the backend and owns the exchange state.
///
/// All mutation goes through `&mut self`, so one exchange has at most one
/// session in flight. Observers follow along through `subscribe`.
pub struct Exchange {
    client: ApiClient,
    thread_id: String,
    state: ExchangeState,
    snapshot_tx: watch::Sender<ExchangeSnapshot>,
    next_session_id: u64,
}

impl Exchange {
    pub fn new(client: ApiClient, thread_id: Option<String>) -> Self {
        let state = ExchangeState::new();
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        Self {
            client,
            thread_id: thread_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            state,
            snapshot_tx,
            next_session_id: 1,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ApiClient::new(config)?;
        Ok(Self::new(client, config.thread_id.clone()))
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<ExchangeSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn send(&mut self, text: &str) -> Result<SessionOutcome, ExchangeError> {
        let request = self.state.begin_send(text, &self.thread_id)?;
        let id = self.allocate_session_id();
        tracing::info!(session = id, thread_id = %self.thread_id, "sending message");

        let mut active =
            ActiveSession::start(id, SessionKind::Send, &mut self.state, &self.snapshot_tx);
        let opened = self.client.open_chat(&request).await;
        active.run(opened).await
    }

    pub async fn resume(
        &mut self,
        decision: ApprovalDecision,
    ) -> Result<SessionOutcome, ExchangeError> {
        let request = self.state.begin_resume(decision, &self.thread_id)?;
        let id = self.allocate_session_id();
        tracing::info!(session = id, thread_id = %request.thread_id, ?decision, "resuming thread");

        let mut active =
            ActiveSession::start(id, SessionKind::Resume, &mut self.state, &self.snapshot_tx);
        let opened = self.client.open_resume(&request).await;
        active.run(opened).await
    }

    pub async fn refresh(&mut self) -> Result<SessionOutcome, ExchangeError> {
        self.send(REFRESH_PROMPT).await
    }

    fn allocate_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }
}

/// Exclusive handle on the state for the lifetime of one session.
///
/// If the owning future is dropped before the stream ends, `Drop` clears
/// `processing` so the exchange is usable again.
struct ActiveSession<'a> {
    id: u64,
    kind: SessionKind,
    state: &'a mut ExchangeState,
    snapshot_tx: &'a watch::Sender<ExchangeSnapshot>,
    settled: bool,
}

impl<'a> ActiveSession<'a> {
    fn start(
        id: u64,
        kind: SessionKind,
        state: &'a mut ExchangeState,
        snapshot_tx: &'a watch::Sender<ExchangeSnapshot>,
    ) -> Self {
        let active = Self {
            id,
            kind,
            state,
            snapshot_tx,
            settled: false,
        };
        active.publish();
        active
    }

    async fn run(
        &mut self,
        opened: Result<ByteStream, TransportError>,
    ) -> Result<SessionOutcome, ExchangeError> {
        let stream = match opened {
            Ok(stream) => stream,
            Err(error) => return Err(self.fail(error)),
        };

        let mut session = StreamSession::open(self.id, self.kind, stream);
        let mut saw_final = false;
        while let Some(item) = session.next_event().await {
            match item {
                Ok(event) => {
                    saw_final |= matches!(event, EventRecord::Final);
                    self.state.apply(event);
                    self.publish();
                }
                Err(error) => return Err(self.fail(error)),
            }
        }

        Ok(self.finish(saw_final))
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }

    fn fail(&mut self, error: TransportError) -> ExchangeError {
        tracing::error!(session = self.id, kind = ?self.kind, %error, "stream session failed");
        self.state.fail_session();
        self.settle();
        ExchangeError::Transport(error)
    }

    fn finish(&mut self, saw_final: bool) -> SessionOutcome {
        let outcome = if self.state.approval().pending {
            SessionOutcome::AwaitingApproval
        } else if saw_final {
            SessionOutcome::Completed
        } else {
            tracing::warn!(session = self.id, "stream closed without a terminal record");
            SessionOutcome::Closed
        };
        self.state.end_session();
        self.settle();
        tracing::info!(session = self.id, ?outcome, "stream session ended");
        outcome
    }

    fn settle(&mut self) {
        self.settled = true;
        self.publish();
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(session = self.id, "stream session abandoned before the stream ended");
            self.state.end_session();
            self.publish();
        }
    }
}
