use crate::error::{ApiJson, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use moonxbt_core::models::{
    ParticipantQuery, TaskCompletionRequest, TaskUpdateResponse, UpdateTaskRequest,
};
use moonxbt_core::AppError;
use serde_json::Value;
use std::sync::Arc;

const UPDATE_FAILED: &str = "Failed to update task";

/// List airdrop participants. Filters are forwarded as-is.
#[tracing::instrument(skip(state, query))]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Json<Value>, HttpAppError> {
    let Query(query) = query?;
    tracing::debug!(?query, "Listing airdrop participants");

    let participants = state
        .agent
        .list_participants(&query)
        .await
        .map_err(|e| AppError::upstream_unavailable("Failed to fetch airdrop participants", e))?;

    Ok(Json(participants))
}

/// Update one participant task from the admin dashboard.
#[tracing::instrument(skip(state, request))]
pub async fn update_participant(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Value>, HttpAppError> {
    let update = request.into_backend()?;
    tracing::info!(fid = %update.farcaster_fid, task = %update.task_name, "Updating participant task");

    let response = state
        .agent
        .update_participant(&update)
        .await
        .map_err(|e| AppError::upstream_unavailable(UPDATE_FAILED, e))?;

    Ok(Json(response))
}

/// Toggle completion of one task. A backend answer without `success` is a failure.
#[tracing::instrument(skip(state, request))]
pub async fn set_task_completion(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<TaskCompletionRequest>,
) -> Result<Json<TaskUpdateResponse>, HttpAppError> {
    let update = request.into_backend()?;
    tracing::info!(fid = %update.farcaster_fid, task = %update.task_name, "Setting task completion");

    let response = state
        .agent
        .update_moonxbt_participant(&update)
        .await
        .map_err(|e| AppError::upstream_unavailable(UPDATE_FAILED, e))?;

    if !response.success {
        let reason = response
            .message
            .clone()
            .unwrap_or_else(|| UPDATE_FAILED.to_string());
        return Err(AppError::upstream_unavailable(UPDATE_FAILED, anyhow::anyhow!(reason)).into());
    }

    Ok(Json(response))
}
