use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

const DEFAULT_PARTICIPANT_LIMIT: &str = "50";

/// Filters accepted by the participant listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    pub fid: Option<String>,
    pub username: Option<String>,
    pub task: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub limit: Option<String>,
    pub start_after: Option<String>,
    pub get_all: Option<String>,
}

impl ParticipantQuery {
    /// Query pairs for the backend, with `limit` and `getAll` defaulted.
    pub fn to_backend_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let optional = [
            ("fid", &self.fid),
            ("username", &self.username),
            ("task", &self.task),
            ("status", &self.status),
            ("platform", &self.platform),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                query.push((name, v.clone()));
            }
        }
        query.push((
            "limit",
            self.limit
                .clone()
                .unwrap_or_else(|| DEFAULT_PARTICIPANT_LIMIT.to_string()),
        ));
        if let Some(start_after) = &self.start_after {
            query.push(("startAfter", start_after.clone()));
        }
        query.push((
            "getAll",
            self.get_all.clone().unwrap_or_else(|| "false".to_string()),
        ));
        query
    }
}

/// Admin update of one participant task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// Farcaster id; the dashboard sends it as a number or a string.
    pub farcaster_fid: Option<Value>,
    pub task_name: Option<String>,
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

/// Short form used by the per-task toggle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionRequest {
    pub fid: Option<Value>,
    pub task_id: Option<String>,
    pub completed: Option<bool>,
}

/// Body forwarded to the backend admin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTaskUpdate {
    pub action: &'static str,
    pub farcaster_fid: Value,
    pub task_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn present(value: &Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v.clone()),
    }
}

impl UpdateTaskRequest {
    pub fn into_backend(self) -> Result<BackendTaskUpdate, AppError> {
        let fid = present(&self.farcaster_fid);
        let task_name = self.task_name.filter(|s| !s.is_empty());
        let (Some(farcaster_fid), Some(task_name)) = (fid, task_name) else {
            return Err(AppError::BadRequest(
                "farcasterFid and taskName are required".to_string(),
            ));
        };
        Ok(BackendTaskUpdate {
            action: "update_task",
            farcaster_fid,
            task_name,
            completed: self.completed,
            notes: self.notes,
        })
    }
}

impl TaskCompletionRequest {
    pub fn into_backend(self) -> Result<BackendTaskUpdate, AppError> {
        let fid = present(&self.fid);
        let task_id = self.task_id.filter(|s| !s.is_empty());
        let (Some(farcaster_fid), Some(task_name)) = (fid, task_id) else {
            return Err(AppError::BadRequest(
                "FID and taskId are required".to_string(),
            ));
        };
        Ok(BackendTaskUpdate {
            action: "update_task",
            farcaster_fid,
            task_name,
            completed: self.completed,
            notes: None,
        })
    }
}

/// Backend acknowledgement of a task update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_query_defaults() {
        let query = ParticipantQuery {
            username: Some("moon".to_string()),
            ..Default::default()
        };
        let pairs = query.to_backend_query();
        assert!(pairs.contains(&("username", "moon".to_string())));
        assert!(pairs.contains(&("limit", "50".to_string())));
        assert!(pairs.contains(&("getAll", "false".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "fid"));
    }

    #[test]
    fn update_requires_fid_and_task() {
        let err = UpdateTaskRequest {
            farcaster_fid: Some(json!(123)),
            ..Default::default()
        }
        .into_backend()
        .unwrap_err();
        assert!(err.to_string().contains("farcasterFid and taskName"));
    }

    #[test]
    fn completion_maps_to_update_task() {
        let body = TaskCompletionRequest {
            fid: Some(json!(42)),
            task_id: Some("follow".to_string()),
            completed: Some(true),
        }
        .into_backend()
        .unwrap();
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({"action": "update_task", "farcasterFid": 42, "taskName": "follow", "completed": true})
        );
    }
}
