//! MoonXBT Infrastructure Library
//!
//! Shared infrastructure used by the proxy server and the command-line tools:
//! - Telemetry initialization (tracing subscriber)
//! - Request id middleware
//! - HTTP error body

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{request_id_middleware, RequestId};
pub use telemetry::{init_cli_tracing, init_telemetry, LogFormat};
