//! Submit-and-poll for work the backend finishes later.
//!
//! A submission either answers with the final body or with a ticket
//! (`isAsync: true`). Tickets are polled on a fixed interval until the backend
//! reports a terminal status, a status call fails, or the polling budget runs out.

mod backend;
mod poller;

use async_trait::async_trait;
use moonxbt_core::models::{SubmitResponse, TaskStatusResponse};
use serde_json::Value;

pub use backend::{HttpTaskBackend, DEFAULT_STATUS_PATH};
pub use poller::{
    AsyncRequestPoller, CompletedCallback, FailedCallback, PollOptions, STATUS_ERROR,
    TIMEOUT_ERROR,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("{0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Where submissions go and where ticket status comes from.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn submit(&self, endpoint: &str, payload: &Value) -> Result<SubmitResponse, PollError>;

    async fn status(&self, ticket_id: &str) -> Result<TaskStatusResponse, PollError>;
}
