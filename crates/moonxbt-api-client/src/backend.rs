//! Methods for the agent and mirror backends the proxy forwards to.

use crate::ApiClient;
use anyhow::Result;
use moonxbt_core::models::{
    AssetRequest, BackendSignedUrl, BackendTaskUpdate, BackendVideoTask, InfluencerVideoJob,
    ParticipantQuery, TaskUpdateResponse,
};
use serde_json::Value;

const AIRDROP_DASHBOARD_PATH: &str = "/a0x-framework/airdrop/admin-dashboard";
const MOONXBT_AIRDROP_DASHBOARD_PATH: &str = "/moonxbt/airdrop/admin-dashboard";
const SIGNED_ASSET_PATH: &str = "/agents/signed-asset-url";

impl ApiClient {
    /// Ask the mirror backend to sign a URL (JSON body).
    pub async fn sign_asset(&self, request: &AssetRequest) -> Result<BackendSignedUrl> {
        self.post_json(SIGNED_ASSET_PATH, request).await
    }

    /// Ask the mirror backend to sign a URL (query string).
    pub async fn sign_asset_by_query(&self, request: &AssetRequest) -> Result<BackendSignedUrl> {
        self.get(
            SIGNED_ASSET_PATH,
            &[
                ("bucketName", request.bucket_name.clone()),
                ("filePath", request.file_path.clone()),
                ("expiresIn", request.expires_in.to_string()),
            ],
        )
        .await
    }

    pub async fn list_participants(&self, query: &ParticipantQuery) -> Result<Value> {
        self.get(AIRDROP_DASHBOARD_PATH, &query.to_backend_query())
            .await
    }

    pub async fn update_participant(&self, update: &BackendTaskUpdate) -> Result<Value> {
        self.post_json(AIRDROP_DASHBOARD_PATH, update).await
    }

    pub async fn update_moonxbt_participant(
        &self,
        update: &BackendTaskUpdate,
    ) -> Result<TaskUpdateResponse> {
        self.post_json(MOONXBT_AIRDROP_DASHBOARD_PATH, update)
            .await
    }

    pub async fn create_influencer_video(&self, job: &InfluencerVideoJob) -> Result<BackendVideoTask> {
        self.post_json("/moonxbt/create-influencer-video", job)
            .await
    }

    pub async fn task_status(&self, task_id: &str) -> Result<Value> {
        let path = format!("/moonxbt/task/{}/status", urlencoding::encode(task_id));
        self.get(&path, &[]).await
    }

    pub async fn influencer_videos(&self, influencer_id: &str) -> Result<Value> {
        let path = format!("/a0x-framework/{}/videos", urlencoding::encode(influencer_id));
        self.get(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{ApiClient, Auth};

    #[tokio::test]
    async fn task_status_encodes_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/moonxbt/task/a%20b/status")
            .match_header("x-api-key", "k")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"processing"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::XApiKey("k".to_string())).unwrap();
        let status = client.task_status("a b").await.unwrap();
        assert_eq!(status["status"], "processing");
        mock.assert_async().await;
    }
}
