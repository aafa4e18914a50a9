//! MoonXBT API Library
//!
//! HTTP proxy routes in front of the agent and mirror backends, plus the
//! application setup used by the binary and the integration tests.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use state::AppState;
