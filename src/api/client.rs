use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::error::TransportError;
use crate::types::{ChatRequest, ResumeRequest};
use crate::util::{endpoint_url, is_local_endpoint_url};
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

const CHAT_ROUTE: &str = "chat";
const RESUME_ROUTE: &str = "chat/resume";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(
        &self,
        route: &str,
        payload: &serde_json::Value,
    ) -> Result<ByteStream, TransportError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: "http://localhost:8000".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Opens the progress stream for a new user message.
    pub async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        self.post_stream(CHAT_ROUTE, request).await
    }

    /// Opens the progress stream that continues a paused thread.
    pub async fn open_resume(
        &self,
        request: &ResumeRequest,
    ) -> Result<ByteStream, TransportError> {
        self.post_stream(RESUME_ROUTE, request).await
    }

    async fn post_stream<T: Serialize>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<ByteStream, TransportError> {
        let request_url = endpoint_url(&self.api_url, route);
        let payload = serde_json::to_value(body)
            .map_err(|error| TransportError::Interrupted(format!("cannot encode request: {error}")))?;

        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &payload);
        }

        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(route, &payload);
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("accept", "application/x-ndjson")
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request_url,
                status,
            });
        }

        tracing::debug!(url = %request_url, %status, "progress stream opened");

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> TransportError {
    let url = request_url.to_string();
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return TransportError::LocalUnreachable { url, source: error };
    }
    if error.is_connect() {
        return TransportError::Unreachable { url, source: error };
    }
    if error.is_timeout() {
        return TransportError::Timeout { url, source: error };
    }
    if let Some(status) = error.status() {
        return TransportError::Status { url, status };
    }
    if error.is_body() || error.is_decode() {
        return TransportError::Interrupted(format!("reading '{url}' failed: {error}"));
    }
    TransportError::Request { url, source: error }
}
