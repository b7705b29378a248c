pub mod api;
pub mod config;
pub mod error;
pub mod runtime;
pub mod state;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{DecodeError, ExchangeError, TransportError};
pub use runtime::{Exchange, SessionOutcome};
