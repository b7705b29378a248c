pub mod exchange;
pub mod session;

pub use exchange::{Exchange, SessionOutcome, REFRESH_PROMPT};
pub use session::{SessionKind, StreamSession};
