use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::util::is_local_endpoint_url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub thread_id: Option<String>,
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            thread_id: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = std::env::var("INFRADESK_API_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let thread_id = std::env::var("INFRADESK_THREAD_ID").ok().and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v.trim().to_string())
            }
        });
        let connect_timeout_secs = match std::env::var("INFRADESK_CONNECT_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => bail!("Invalid INFRADESK_CONNECT_TIMEOUT_SECS '{raw}': expected seconds"),
            },
            Err(_) => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            thread_id,
            connect_timeout_secs,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid INFRADESK_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if let Some(thread_id) = &self.thread_id {
            if thread_id.trim().is_empty() {
                bail!("Thread id must not be blank");
            }
        }

        if self.connect_timeout_secs == 0 {
            bail!("Connect timeout must be at least one second");
        }

        if !self.is_local_endpoint() && self.api_url.starts_with("http://") {
            tracing::warn!(url = %self.api_url, "agent backend reached over plain http");
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_uses_defaults_when_env_unset() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::remove_var("INFRADESK_API_URL");
        std::env::remove_var("INFRADESK_THREAD_ID");
        std::env::remove_var("INFRADESK_CONNECT_TIMEOUT_SECS");

        let config = Config::load().expect("config should load");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.thread_id, None);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.is_local_endpoint());
    }

    #[test]
    fn test_load_reads_env_overrides() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var("INFRADESK_API_URL", " https://agents.example.com ");
        std::env::set_var("INFRADESK_THREAD_ID", "thread-42");
        std::env::set_var("INFRADESK_CONNECT_TIMEOUT_SECS", "3");

        let config = Config::load().expect("config should load");
        assert_eq!(config.api_url, "https://agents.example.com");
        assert_eq!(config.thread_id.as_deref(), Some("thread-42"));
        assert_eq!(config.connect_timeout_secs, 3);

        std::env::remove_var("INFRADESK_API_URL");
        std::env::remove_var("INFRADESK_THREAD_ID");
        std::env::remove_var("INFRADESK_CONNECT_TIMEOUT_SECS");
    }

    #[test]
    fn test_load_rejects_non_numeric_timeout() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var("INFRADESK_CONNECT_TIMEOUT_SECS", "soon");
        assert!(Config::load().is_err());
        std::env::remove_var("INFRADESK_CONNECT_TIMEOUT_SECS");
    }

    #[test]
    fn test_validate_rejects_blank_thread_id_and_zero_timeout() {
        let blank_thread = Config {
            thread_id: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(blank_thread.validate().is_err());

        let zero_timeout = Config {
            connect_timeout_secs: 0,
            ..Config::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_lookalike_local_host_counts_as_remote() {
        let lookalike = Config {
            api_url: "http://localhost.evil.com:8000".to_string(),
            ..Config::default()
        };
        assert!(!lookalike.is_local_endpoint());

        let loopback_v6 = Config {
            api_url: "http://[::1]:8000".to_string(),
            ..Config::default()
        };
        assert!(loopback_v6.is_local_endpoint());
    }
}
