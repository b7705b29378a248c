use crate::error::DecodeError;
use crate::util::parse_bool_str;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEBUG_PAYLOAD_ENV: &str = "INFRADESK_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "INFRADESK_LOG_PATH";
const LOG_FILTER_ENV: &str = "INFRADESK_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the global `tracing` subscriber.
///
/// Logs go to `INFRADESK_LOG_PATH` when set, stderr otherwise, so stdout stays
/// reserved for the transcript.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match resolve_log_path() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file '{path}'"))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|error| anyhow::anyhow!("cannot install logger: {error}"))
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|error| anyhow::anyhow!("cannot install logger: {error}")),
    }
}

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "outbound request");
}

pub fn emit_decode_error(error: &DecodeError) {
    tracing::warn!(error = %error, line = %error.line, "skipping malformed stream line");
}

pub fn emit_discarded_fragment(fragment: &str) {
    tracing::warn!(
        fragment,
        bytes = fragment.len(),
        "stream ended mid-line; discarding unterminated fragment"
    );
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_enabled_accepts_true_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "TRUE");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "nope");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
        assert!(!debug_payload_enabled());
    }

    #[test]
    fn test_resolve_log_path_ignores_blank_values() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, "   ");
        assert_eq!(resolve_log_path(), None);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("infradesk.log");
        std::env::set_var(LOG_PATH_ENV, path.to_str().expect("utf8 path"));
        assert_eq!(resolve_log_path().as_deref(), path.to_str());
        std::env::remove_var(LOG_PATH_ENV);
    }
}
