use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::validation::validate_optional_url;

/// Request DTO for generating a promotional video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, description and website URL are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, description and website URL are required"))]
    pub description: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Name, description and website URL are required"),
        url(message = "Website URL is not valid")
    )]
    pub website_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_optional_url, message = "Documentation URL is not valid"))]
    pub website_doc_url: Option<String>,
}

impl CreateVideoRequest {
    /// Trim every field and drop an empty documentation URL.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            website_url: self.website_url.trim().to_string(),
            website_doc_url: self
                .website_doc_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub name: String,
    pub description: String,
    pub website_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_doc_url: Option<String>,
}

/// Job description sent to the video generation backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerVideoJob {
    pub project_data: ProjectData,
    pub cloud_storage_service: bool,
    pub scrape_website: bool,
    pub use_cloud_storage: bool,
    pub influencer_id: String,
    pub voice_id: String,
    pub capture_website: bool,
    pub screenshot_service: &'static str,
}

impl InfluencerVideoJob {
    pub fn new(request: CreateVideoRequest, influencer_id: &str, voice_id: &str) -> Self {
        let request = request.normalized();
        Self {
            project_data: ProjectData {
                name: request.name,
                description: request.description,
                website_url: request.website_url,
                website_doc_url: request.website_doc_url,
            },
            cloud_storage_service: true,
            scrape_website: true,
            use_cloud_storage: true,
            influencer_id: influencer_id.to_string(),
            voice_id: voice_id.to_string(),
            capture_website: true,
            screenshot_service: "screenshotmachine",
        }
    }
}

/// Backend answer to a video job submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendVideoTask {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoResponse {
    pub message: String,
    pub task_id: String,
}

/// Query of `/api/check-video-status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusQuery {
    pub task_id: Option<String>,
}

/// Query of `/api/get-videos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub influencer_id: Option<String>,
}

/// Generated videos for one influencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub videos: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Value>,
}
