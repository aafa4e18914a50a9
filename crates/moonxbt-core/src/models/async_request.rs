use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Lifecycle of a submitted request. Ordered: a request only ever moves to a
/// status of equal or higher rank, and `Completed`/`Failed` are final.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RequestStatus {
    fn rank(self) -> u8 {
        match self {
            RequestStatus::Idle => 0,
            RequestStatus::Pending => 1,
            RequestStatus::Processing => 2,
            RequestStatus::Completed | RequestStatus::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Failed)
    }

    /// Whether moving from `self` to `next` keeps the status monotonic.
    pub fn can_advance_to(self, next: RequestStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RequestStatus::Idle => write!(f, "idle"),
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Processing => write!(f, "processing"),
            RequestStatus::Completed => write!(f, "completed"),
            RequestStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(RequestStatus::Idle),
            "pending" | "queued" => Ok(RequestStatus::Pending),
            "processing" | "running" | "in_progress" => Ok(RequestStatus::Processing),
            "completed" | "done" | "success" => Ok(RequestStatus::Completed),
            "failed" | "error" => Ok(RequestStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid request status: {}", s)),
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Snapshot of an asynchronous request as seen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncRequestState {
    pub ticket_id: Option<String>,
    pub status: RequestStatus,
    pub progress: u8,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub estimated_time: Option<String>,
    pub is_loading: bool,
}

/// Acknowledgement for work that will finish later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncTicket {
    pub ticket_id: String,
    #[serde(default = "pending")]
    pub status: RequestStatus,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

fn pending() -> RequestStatus {
    RequestStatus::Pending
}

/// What a submission endpoint answered.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    /// `isAsync: true`; poll the ticket for the outcome.
    Async(AsyncTicket),
    /// Any other body is the final result.
    Immediate(Value),
}

impl SubmitResponse {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let is_async = value
            .get("isAsync")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if is_async {
            Ok(SubmitResponse::Async(serde_json::from_value(value)?))
        } else {
            Ok(SubmitResponse::Immediate(value))
        }
    }
}

/// One answer from the status endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub status: RequestStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub synthetic_response: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    /// The payload to hand to the caller; a synthetic response wins over `result`.
    pub fn payload(&self) -> Option<Value> {
        self.synthetic_response
            .clone()
            .or_else(|| self.result.clone())
    }

    /// Progress clamped to 0..=100.
    pub fn progress_percent(&self) -> u8 {
        self.progress
            .map(|p| p.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_is_monotonic() {
        assert!(RequestStatus::Idle.can_advance_to(RequestStatus::Pending));
        assert!(RequestStatus::Pending.can_advance_to(RequestStatus::Processing));
        assert!(RequestStatus::Processing.can_advance_to(RequestStatus::Processing));
        assert!(!RequestStatus::Processing.can_advance_to(RequestStatus::Pending));
        assert!(!RequestStatus::Completed.can_advance_to(RequestStatus::Failed));
        assert!(!RequestStatus::Failed.can_advance_to(RequestStatus::Processing));
    }

    #[test]
    fn status_accepts_backend_aliases() {
        assert_eq!(
            serde_json::from_value::<RequestStatus>(json!("running")).unwrap(),
            RequestStatus::Processing
        );
        assert_eq!(
            "COMPLETED".parse::<RequestStatus>().unwrap(),
            RequestStatus::Completed
        );
        assert!("paused".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn submit_response_detects_async() {
        let response = SubmitResponse::from_value(
            json!({"isAsync": true, "ticketId": "t1", "status": "pending", "estimatedTime": "30s"}),
        )
        .unwrap();
        match response {
            SubmitResponse::Async(ticket) => {
                assert_eq!(ticket.ticket_id, "t1");
                assert_eq!(ticket.estimated_time.as_deref(), Some("30s"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let response = SubmitResponse::from_value(json!({"isAsync": false, "x": 1})).unwrap();
        assert!(matches!(response, SubmitResponse::Immediate(_)));
    }

    #[test]
    fn payload_prefers_synthetic_response() {
        let response: TaskStatusResponse = serde_json::from_value(json!({
            "status": "completed",
            "result": {"a": 1},
            "syntheticResponse": {"b": 2}
        }))
        .unwrap();
        assert_eq!(response.payload(), Some(json!({"b": 2})));
        assert_eq!(response.progress_percent(), 0);
    }
}
