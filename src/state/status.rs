use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```json\r?\n(\{[\s\S]*?\})\r?\n```").expect("static regex is valid")
});

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Healthy,
    Warning,
    Error,
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentStatus {
    #[serde(default)]
    pub status: MetricStatus,
    #[serde(default)]
    pub msg: String,
}

impl Default for ComponentStatus {
    fn default() -> Self {
        Self {
            status: MetricStatus::Unknown,
            msg: "Not Scanned".to_string(),
        }
    }
}

/// Infrastructure health summary published by the scanning agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStatus {
    #[serde(default)]
    pub timestamp: String,
    pub k8s: ComponentStatus,
    pub gcp: ComponentStatus,
    #[serde(default)]
    pub gmp: ComponentStatus,
    #[serde(default)]
    pub datadog: ComponentStatus,
    #[serde(default)]
    pub azion: ComponentStatus,
}

/// Looks for a fenced JSON status block in an assistant message.
pub fn extract_system_status(content: &str) -> Option<SystemStatus> {
    let captures = JSON_BLOCK.captures(content)?;
    let block = captures.get(1)?.as_str();
    match serde_json::from_str::<SystemStatus>(block) {
        Ok(status) => Some(status),
        Err(error) => {
            tracing::debug!(%error, "json block is not a system status report");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_status_block_and_defaults_missing_components() {
        let content = "Scan complete.\n```json\n{\"timestamp\":\"2026-01-01T00:00:00Z\",\"k8s\":{\"status\":\"healthy\",\"msg\":\"12/12 pods\"},\"gcp\":{\"status\":\"warning\",\"msg\":\"quota 91%\"}}\n```\n";

        let status = extract_system_status(content).expect("status block");
        assert_eq!(status.k8s.status, MetricStatus::Healthy);
        assert_eq!(status.gcp.msg, "quota 91%");
        assert_eq!(status.datadog, ComponentStatus::default());
    }

    #[test]
    fn test_ignores_json_blocks_without_required_components() {
        let content = "```json\n{\"pods\": 3}\n```";
        assert!(extract_system_status(content).is_none());
        assert!(extract_system_status("no block here").is_none());
    }

    #[test]
    fn test_unrecognised_metric_status_maps_to_unknown() {
        let content = "```json\n{\"k8s\":{\"status\":\"degraded\",\"msg\":\"x\"},\"gcp\":{\"status\":\"error\",\"msg\":\"y\"}}\n```";
        let status = extract_system_status(content).expect("status block");
        assert_eq!(status.k8s.status, MetricStatus::Unknown);
        assert_eq!(status.gcp.status, MetricStatus::Error);
    }
}
