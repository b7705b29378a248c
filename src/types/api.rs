use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Prior conversation entry as the backend expects it in `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub thread_id: String,
    pub action: ApprovalDecision,
}

/// One line of the NDJSON progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRecord {
    Activity {
        agent: String,
    },
    ToolCall {
        agent: String,
        tool: String,
        #[serde(default = "default_json_object")]
        args: Value,
    },
    /// Result of a tool call, reported by the backend after the call ran.
    ToolOutput {
        #[serde(default)]
        agent: Option<String>,
        tool: String,
        #[serde(default)]
        content: Value,
    },
    Message {
        #[serde(default)]
        agent: Option<String>,
        content: String,
    },
    ApprovalRequired {
        #[serde(default)]
        thread_id: Option<String>,
    },
    Final,
    #[serde(other)]
    Unknown,
}

impl EventRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            EventRecord::Activity { .. } => "activity",
            EventRecord::ToolCall { .. } => "tool_call",
            EventRecord::ToolOutput { .. } => "tool_output",
            EventRecord::Message { .. } => "message",
            EventRecord::ApprovalRequired { .. } => "approval_required",
            EventRecord::Final => "final",
            EventRecord::Unknown => "unknown",
        }
    }
}

fn default_json_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_omits_missing_thread_id() {
        let request = ChatRequest {
            message: "Scan infra".into(),
            history: vec![HistoryEntry {
                role: Role::Assistant,
                content: "Pods healthy".into(),
            }],
            thread_id: None,
        };
        let serialized = serde_json::to_value(&request).unwrap();
        assert_eq!(
            serialized,
            json!({
                "message": "Scan infra",
                "history": [{"role": "assistant", "content": "Pods healthy"}]
            })
        );
    }

    #[test]
    fn test_resume_request_action_is_lowercase() {
        let request = ResumeRequest {
            thread_id: "t-1".into(),
            action: ApprovalDecision::Deny,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"thread_id": "t-1", "action": "deny"})
        );
    }

    #[test]
    fn test_tool_call_without_args_defaults_to_empty_object() {
        let event: EventRecord =
            serde_json::from_str(r#"{"type":"tool_call","agent":"K8s_Specialist","tool":"list_pods"}"#)
                .unwrap();
        assert_eq!(
            event,
            EventRecord::ToolCall {
                agent: "K8s_Specialist".into(),
                tool: "list_pods".into(),
                args: json!({}),
            }
        );
    }

    #[test]
    fn test_unknown_type_maps_to_unknown_variant() {
        let event: EventRecord = serde_json::from_str(r#"{"type":"heartbeat","at":1}"#).unwrap();
        assert_eq!(event, EventRecord::Unknown);
        assert_eq!(event.kind(), "unknown");
    }

    #[test]
    fn test_approval_required_accepts_optional_thread_id() {
        let bare: EventRecord = serde_json::from_str(r#"{"type":"approval_required"}"#).unwrap();
        assert_eq!(bare, EventRecord::ApprovalRequired { thread_id: None });

        let tagged: EventRecord =
            serde_json::from_str(r#"{"type":"approval_required","thread_id":"abc"}"#).unwrap();
        assert_eq!(
            tagged,
            EventRecord::ApprovalRequired {
                thread_id: Some("abc".into())
            }
        );
    }
}
