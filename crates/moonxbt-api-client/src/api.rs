//! Methods for the public `/api/*` proxy routes.

use crate::ApiClient;
use anyhow::Result;
use moonxbt_core::models::{
    AssetRequest, CreateVideoRequest, CreateVideoResponse, ParticipantQuery,
    SignedAssetUrlResponse, TaskCompletionRequest, TaskUpdateResponse, UpdateTaskRequest,
    VideoListResponse,
};
use serde_json::Value;

pub const SIGNED_URL_PATH: &str = "/api/assets/signed-url";

impl ApiClient {
    /// Request a signed URL for an asset.
    pub async fn request_signed_url(&self, request: &AssetRequest) -> Result<SignedAssetUrlResponse> {
        self.post_json(SIGNED_URL_PATH, request).await
    }

    /// Start generating a promotional video; returns the backend task id.
    pub async fn create_video(&self, request: &CreateVideoRequest) -> Result<CreateVideoResponse> {
        self.post_json("/api/create-video", request).await
    }

    /// Current status of a video generation task.
    pub async fn check_video_status(&self, task_id: &str) -> Result<Value> {
        self.get("/api/check-video-status", &[("taskId", task_id.to_string())])
            .await
    }

    /// Videos generated for an influencer.
    pub async fn get_videos(&self, influencer_id: &str) -> Result<VideoListResponse> {
        self.get("/api/get-videos", &[("influencerId", influencer_id.to_string())])
            .await
    }

    /// Airdrop participants matching the filters.
    pub async fn airdrop_participants(&self, query: &ParticipantQuery) -> Result<Value> {
        self.get("/api/airdrop-participants", &query.to_backend_query())
            .await
    }

    pub async fn update_participant_task(&self, request: &UpdateTaskRequest) -> Result<Value> {
        self.post_json("/api/airdrop-participants", request).await
    }

    pub async fn set_task_completion(
        &self,
        request: &TaskCompletionRequest,
    ) -> Result<TaskUpdateResponse> {
        self.post_json("/api/airdrop-participants/task", request)
            .await
    }
}
