use super::client::ByteStream;
use super::logging::{emit_decode_error, emit_discarded_fragment};
use crate::error::{DecodeError, TransportError};
use crate::types::EventRecord;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Splits an incoming byte stream into newline-terminated lines.
///
/// Splitting happens on raw bytes and each line is decoded exactly once, when
/// its terminating newline arrives. `0x0A` never occurs inside a multi-byte
/// UTF-8 sequence, so a character cut in half by a chunk edge stays intact in
/// the retained fragment until the rest of it shows up.
#[derive(Debug, Default)]
pub struct LineBuffer {
    fragment: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(newline) = rest.iter().position(|byte| *byte == b'\n') {
            self.fragment.extend_from_slice(&rest[..newline]);
            lines.push(take_line(&mut self.fragment));
            rest = &rest[newline + 1..];
        }

        self.fragment.extend_from_slice(rest);
        lines
    }

    pub fn pending_len(&self) -> usize {
        self.fragment.len()
    }

    /// Drops the unterminated trailing fragment, returning it for logging.
    pub fn finish(&mut self) -> Option<String> {
        if self.fragment.is_empty() {
            return None;
        }
        Some(take_line(&mut self.fragment))
    }
}

fn take_line(fragment: &mut Vec<u8>) -> String {
    if fragment.last() == Some(&b'\r') {
        fragment.pop();
    }
    let line = String::from_utf8_lossy(fragment).into_owned();
    fragment.clear();
    line
}

/// Decodes one stream line.
///
/// Blank lines and records with an unrecognised `type` yield `Ok(None)`.
pub fn decode_line(line: &str) -> Result<Option<EventRecord>, DecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<EventRecord>(trimmed) {
        Ok(EventRecord::Unknown) => {
            tracing::debug!(line = trimmed, "ignoring stream record with unknown type");
            Ok(None)
        }
        Ok(event) => Ok(Some(event)),
        Err(source) => Err(DecodeError {
            line: trimmed.to_string(),
            source,
        }),
    }
}

pub(crate) fn decode_or_log(line: &str) -> Option<EventRecord> {
    match decode_line(line) {
        Ok(event) => event,
        Err(error) => {
            emit_decode_error(&error);
            None
        }
    }
}

/// Synchronous chunk-in, events-out view of the protocol.
#[derive(Default)]
pub struct StreamParser {
    lines: LineBuffer,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<EventRecord> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| decode_or_log(line))
            .collect()
    }

    pub fn finish(&mut self) -> Option<String> {
        let fragment = self.lines.finish();
        if let Some(fragment) = &fragment {
            emit_discarded_fragment(fragment);
        }
        fragment
    }
}

struct ReaderState {
    stream: ByteStream,
    buffer: LineBuffer,
    ready: VecDeque<String>,
    done: bool,
}

/// Turns a byte stream into a lazy, finite sequence of lines.
///
/// The sequence ends when the byte stream ends or yields an error; the error is
/// the last item. A trailing fragment with no newline is discarded.
pub fn consume(stream: ByteStream) -> LineStream {
    let state = ReaderState {
        stream,
        buffer: LineBuffer::new(),
        ready: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            if state.done {
                return None;
            }

            match state.stream.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.buffer.push(&chunk);
                    tracing::trace!(
                        lines = lines.len(),
                        pending = state.buffer.pending_len(),
                        "chunk received"
                    );
                    state.ready.extend(lines);
                }
                Some(Err(error)) => {
                    state.done = true;
                    return Some((Err(error), state));
                }
                None => {
                    state.done = true;
                    if let Some(fragment) = state.buffer.finish() {
                        emit_discarded_fragment(&fragment);
                    }
                }
            }
        }
    }))
}
