use super::approval::{ApprovalGate, ApprovalState};
use super::conversation::{Conversation, Message};
use super::status::{extract_system_status, SystemStatus};
use super::steps::{AgentStep, StepTracker};
use crate::error::ExchangeError;
use crate::types::{ApprovalDecision, ChatRequest, EventRecord, ResumeRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TRANSPORT_FAILURE_MESSAGE: &str = "Error communicating with the agent system.";

/// Point-in-time copy of the exchange handed to observers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSnapshot {
    pub steps: Vec<AgentStep>,
    pub messages: Vec<Message>,
    pub processing: bool,
    pub approval: ApprovalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_status: Option<SystemStatus>,
}

/// Single-writer view model of one exchange with the agent backend.
///
/// Mutated only through `begin_send`, `begin_resume`, `apply` and the
/// session-end hooks, in stream arrival order.
#[derive(Debug, Default)]
pub struct ExchangeState {
    steps: StepTracker,
    conversation: Conversation,
    approval: ApprovalGate,
    processing: bool,
    system_status: Option<SystemStatus>,
}

impl ExchangeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[AgentStep] {
        self.steps.steps()
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn approval(&self) -> &ApprovalState {
        self.approval.state()
    }

    pub fn system_status(&self) -> Option<&SystemStatus> {
        self.system_status.as_ref()
    }

    /// Guards and records a new user message, returning the request to send.
    pub fn begin_send(
        &mut self,
        text: &str,
        thread_id: &str,
    ) -> Result<ChatRequest, ExchangeError> {
        if self.processing {
            return Err(ExchangeError::Busy);
        }
        if self.approval.is_pending() {
            return Err(ExchangeError::AwaitingApproval);
        }
        if text.trim().is_empty() {
            return Err(ExchangeError::EmptyMessage);
        }

        let history = self.conversation.history();
        self.conversation.push_user_message(text.to_string());
        self.steps.reset();
        self.processing = true;

        Ok(ChatRequest {
            message: text.to_string(),
            history,
            thread_id: Some(thread_id.to_string()),
        })
    }

    /// Consumes the pending approval; the step list carries over into the resumed stream.
    pub fn begin_resume(
        &mut self,
        decision: ApprovalDecision,
        thread_id: &str,
    ) -> Result<ResumeRequest, ExchangeError> {
        if self.processing {
            return Err(ExchangeError::Busy);
        }
        let request = self.approval.decide(decision, thread_id)?;
        self.processing = true;
        Ok(request)
    }

    pub fn apply(&mut self, event: EventRecord) {
        match event {
            EventRecord::Activity { agent } => {
                self.steps.on_activity(&agent, Utc::now());
            }
            EventRecord::ToolCall { agent, tool, args } => {
                if let Some(step) = self.steps.active_step() {
                    if step.agent != agent {
                        tracing::debug!(
                            active = %step.agent,
                            %agent,
                            %tool,
                            "tool_call from an agent other than the active step"
                        );
                    }
                }
                if !self.steps.on_tool_call(&tool, args) {
                    tracing::debug!(%agent, %tool, "tool_call before any activity; dropped");
                }
            }
            EventRecord::ToolOutput {
                agent,
                tool,
                content,
            } => {
                if !self.steps.on_tool_output(&tool, render_tool_output(content)) {
                    tracing::debug!(?agent, %tool, "tool_output without a matching call; dropped");
                }
            }
            EventRecord::Message { agent, content } => {
                self.conversation.push_assistant_message(content, agent);
                if let Some(status) = self
                    .conversation
                    .last_assistant()
                    .and_then(|message| extract_system_status(&message.content))
                {
                    self.system_status = Some(status);
                }
            }
            EventRecord::ApprovalRequired { thread_id } => {
                self.approval.require(thread_id);
                self.processing = false;
            }
            EventRecord::Final => {
                self.steps.complete_all();
                if !self.approval.is_pending() {
                    self.processing = false;
                }
            }
            EventRecord::Unknown => {}
        }
    }

    /// Stream ended, with or without a terminal event.
    pub fn end_session(&mut self) {
        self.processing = false;
    }

    /// Transport failure: report it in the log and leave the state idle.
    pub fn fail_session(&mut self) {
        self.conversation
            .push_assistant_message(TRANSPORT_FAILURE_MESSAGE.to_string(), None);
        self.processing = false;
    }

    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            steps: self.steps.steps().to_vec(),
            messages: self.conversation.messages().to_vec(),
            processing: self.processing,
            approval: self.approval.state().clone(),
            system_status: self.system_status.clone(),
        }
    }
}

fn render_tool_output(content: Value) -> String {
    match content {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
