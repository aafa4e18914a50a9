//! MoonXBT Core Library
//!
//! Configuration, error types, request/response models and validation helpers
//! shared by the proxy server, the API client and the client-side services.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
