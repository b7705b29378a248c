mod api;

pub use api::{
    ApprovalDecision, ChatRequest, EventRecord, HistoryEntry, ResumeRequest, Role,
};
