use crate::api::client::{ByteStream, MockStreamProducer};
use crate::error::TransportError;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// One scripted piece of a mock response body.
#[derive(Debug, Clone)]
pub enum MockChunk {
    Data(String),
    Fail(String),
    /// Keeps the stream open without yielding anything further.
    Stall,
}

impl MockChunk {
    pub fn line(text: &str) -> Self {
        Self::Data(format!("{text}\n"))
    }

    pub fn raw(text: &str) -> Self {
        Self::Data(text.to_string())
    }
}

/// What the mock does for one outbound request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Stream(Vec<MockChunk>),
    Refuse(String),
}

impl MockResponse {
    pub fn lines(lines: &[&str]) -> Self {
        Self::Stream(lines.iter().map(|line| MockChunk::line(line)).collect())
    }
}

#[derive(Clone, Default)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Route and JSON body of every request seen so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(
        &self,
        route: &str,
        payload: &Value,
    ) -> Result<ByteStream, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((route.to_string(), payload.clone()));

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(TransportError::Interrupted(
                "MockApiClient: No more responses configured".to_string(),
            ));
        }

        match responses_guard.remove(0) {
            MockResponse::Refuse(reason) => Err(TransportError::Interrupted(reason)),
            MockResponse::Stream(chunks) => {
                let stalls = chunks.iter().any(|chunk| matches!(chunk, MockChunk::Stall));
                let byte_chunks: Vec<Result<Bytes, TransportError>> = chunks
                    .into_iter()
                    .take_while(|chunk| !matches!(chunk, MockChunk::Stall))
                    .map(|chunk| match chunk {
                        MockChunk::Data(text) => Ok(Bytes::from(text)),
                        MockChunk::Fail(reason) => Err(TransportError::Interrupted(reason)),
                        MockChunk::Stall => unreachable!("stall chunks are filtered above"),
                    })
                    .collect();

                if stalls {
                    Ok(Box::pin(stream::iter(byte_chunks).chain(stream::pending())))
                } else {
                    Ok(Box::pin(stream::iter(byte_chunks)))
                }
            }
        }
    }
}
