use thiserror::Error;

/// Network or stream failure. Terminal for the session that hit it.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot reach local agent backend '{url}': {source}. Start the backend or update INFRADESK_API_URL.")]
    LocalUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cannot reach agent backend '{url}': {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to '{url}' timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("agent backend '{url}' returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

/// One stream line that is not a structurally valid event record.
#[derive(Debug, Error)]
#[error("unparseable stream line: {source}")]
pub struct DecodeError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("a stream session is already active for this exchange")]
    Busy,
    #[error("the backend is paused waiting for an approval decision")]
    AwaitingApproval,
    #[error("no approval is pending")]
    NoPendingApproval,
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
