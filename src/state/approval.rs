use crate::error::ExchangeError;
use crate::types::{ApprovalDecision, ResumeRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalState {
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Human-in-the-loop checkpoint: set by `approval_required`, cleared by a decision.
#[derive(Debug, Default)]
pub struct ApprovalGate {
    state: ApprovalState,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn state(&self) -> &ApprovalState {
        &self.state
    }

    pub fn require(&mut self, thread_id: Option<String>) {
        self.state.pending = true;
        if thread_id.is_some() {
            self.state.thread_id = thread_id;
        }
    }

    /// Consumes the pending checkpoint and builds the resume request.
    ///
    /// `fallback_thread_id` is used when the backend did not name the thread.
    pub fn decide(
        &mut self,
        decision: ApprovalDecision,
        fallback_thread_id: &str,
    ) -> Result<ResumeRequest, ExchangeError> {
        if !self.state.pending {
            return Err(ExchangeError::NoPendingApproval);
        }
        self.state.pending = false;
        let thread_id = self
            .state
            .thread_id
            .take()
            .unwrap_or_else(|| fallback_thread_id.to_string());
        Ok(ResumeRequest {
            thread_id,
            action: decision,
        })
    }
}
