use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Never assigned by the tracker; steps are created active.
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRecord {
    pub tool: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStep {
    pub agent: String,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Ordered, append-only list of agent turns for the current exchange.
#[derive(Debug, Default)]
pub struct StepTracker {
    steps: Vec<AgentStep>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn active_step(&self) -> Option<&AgentStep> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.status == StepStatus::Active)
    }

    /// Only a new user send clears the list; resumes keep appending.
    pub fn reset(&mut self) {
        self.steps.clear();
    }

    pub fn on_activity(&mut self, agent: &str, now: DateTime<Utc>) {
        if let Some(last) = self.steps.last_mut() {
            last.status = StepStatus::Completed;
        }
        self.steps.push(AgentStep {
            agent: agent.to_string(),
            status: StepStatus::Active,
            timestamp: now,
            tool_calls: Vec::new(),
        });
    }

    /// Returns false when there is no step to attach the call to.
    pub fn on_tool_call(&mut self, tool: &str, args: Value) -> bool {
        let Some(last) = self.steps.last_mut() else {
            return false;
        };
        last.tool_calls.push(ToolCallRecord {
            tool: tool.to_string(),
            args,
            output: None,
        });
        true
    }

    /// Attaches output to the latest matching call on the last step that has none yet.
    pub fn on_tool_output(&mut self, tool: &str, output: String) -> bool {
        let Some(last) = self.steps.last_mut() else {
            return false;
        };
        match last
            .tool_calls
            .iter_mut()
            .rev()
            .find(|call| call.tool == tool && call.output.is_none())
        {
            Some(call) => {
                call.output = Some(output);
                true
            }
            None => false,
        }
    }

    pub fn complete_all(&mut self) {
        for step in &mut self.steps {
            step.status = StepStatus::Completed;
        }
    }
}
