use crate::api::stream::{consume, decode_or_log, LineStream};
use crate::api::ByteStream;
use crate::error::TransportError;
use crate::types::EventRecord;
use futures::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Send,
    Resume,
}

/// One transport session: the response stream of a single send or resume request.
///
/// Not restartable; a new request needs a new session.
pub struct StreamSession {
    id: u64,
    kind: SessionKind,
    lines: LineStream,
}

impl StreamSession {
    pub fn open(id: u64, kind: SessionKind, stream: ByteStream) -> Self {
        tracing::debug!(session = id, ?kind, "stream session opened");
        Self {
            id,
            kind,
            lines: consume(stream),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Next decoded event in arrival order.
    ///
    /// Malformed lines are logged and skipped. `None` means the stream ended;
    /// an `Err` is always the last item.
    pub async fn next_event(&mut self) -> Option<Result<EventRecord, TransportError>> {
        while let Some(item) = self.lines.next().await {
            match item {
                Ok(line) => {
                    if let Some(event) = decode_or_log(&line) {
                        tracing::trace!(session = self.id, kind = event.kind(), "event received");
                        return Some(Ok(event));
                    }
                }
                Err(error) => return Some(Err(error)),
            }
        }
        None
    }
}
