use crate::error::{validation_message, ApiJson, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use moonxbt_core::models::{
    CreateVideoRequest, CreateVideoResponse, InfluencerVideoJob, VideoListQuery,
    VideoStatusQuery,
};
use moonxbt_core::AppError;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Start generating a promotional video for a project.
#[tracing::instrument(skip(state, request))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateVideoRequest>,
) -> Result<Json<CreateVideoResponse>, HttpAppError> {
    let request = request.normalized();
    request
        .validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))?;

    let job = InfluencerVideoJob::new(request, &state.config.influencer_id, &state.config.voice_id);
    tracing::info!(project = %job.project_data.name, "Creating influencer video");

    let task = state
        .agent
        .create_influencer_video(&job)
        .await
        .map_err(|e| AppError::upstream_unavailable("Failed to create promotional video", e))?;

    tracing::info!(task_id = %task.task_id, "Video creation initiated");
    Ok(Json(CreateVideoResponse {
        message: "Video creation initiated".to_string(),
        task_id: task.task_id,
    }))
}

/// Status of a video generation task, as reported by the backend.
#[tracing::instrument(skip(state, query))]
pub async fn check_video_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VideoStatusQuery>, QueryRejection>,
) -> Result<Json<Value>, HttpAppError> {
    let Query(query) = query?;
    let task_id = query
        .task_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Task ID is required".to_string()))?;

    let status = state
        .agent
        .task_status(&task_id)
        .await
        .map_err(|e| AppError::upstream_unavailable("Failed to check video status", e))?;

    Ok(Json(status))
}

#[tracing::instrument(skip(state, query))]
pub async fn get_videos(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VideoListQuery>, QueryRejection>,
) -> Result<Json<Value>, HttpAppError> {
    let Query(query) = query?;
    let influencer_id = query
        .influencer_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Influencer ID is required".to_string()))?;

    let videos = state
        .agent
        .influencer_videos(&influencer_id)
        .await
        .map_err(|e| AppError::upstream_unavailable("Failed to fetch videos", e))?;

    Ok(Json(videos))
}
