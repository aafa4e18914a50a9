//! Error types module
//!
//! All errors surfaced by the proxy routes are unified under [`AppError`]. Each
//! variant describes its own HTTP presentation through [`ErrorMetadata`], so the
//! server can render a consistent `{error, details}` body and pick a log level.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream rejections
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Optional extra detail for the client
    fn client_details(&self) -> Option<String>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The backend answered with a non-success status that is passed through.
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The backend could not be reached or returned an unusable body. The message
    /// is the route-specific text shown to the client.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl AppError {
    /// Wrap a failed backend call with the message the client should see.
    pub fn upstream_unavailable(message: impl Into<String>, source: anyhow::Error) -> Self {
        AppError::UpstreamUnavailable {
            message: message.into(),
            source,
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Upstream { .. } => "Upstream",
            AppError::UpstreamUnavailable { .. } => "UpstreamUnavailable",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) | AppError::BadRequest(_) => 400,
            AppError::Upstream { status, .. } => *status,
            AppError::UpstreamUnavailable { .. } | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Upstream { message, .. } => message.clone(),
            AppError::UpstreamUnavailable { message, .. } => message.clone(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }

    fn client_details(&self) -> Option<String> {
        match self {
            AppError::Upstream { details, .. } => details.clone(),
            _ => None,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::BadRequest(_) => LogLevel::Debug,
            AppError::Upstream { status, .. } if *status < 500 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
