pub mod approval;
pub mod conversation;
pub mod exchange;
pub mod status;
pub mod steps;

pub use approval::{ApprovalGate, ApprovalState};
pub use conversation::{Conversation, Message};
pub use exchange::{ExchangeSnapshot, ExchangeState, TRANSPORT_FAILURE_MESSAGE};
pub use status::{ComponentStatus, MetricStatus, SystemStatus};
pub use steps::{AgentStep, StepStatus, StepTracker, ToolCallRecord};
