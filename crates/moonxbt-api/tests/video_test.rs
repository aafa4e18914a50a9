//! Video route and health tests.

mod helpers;

use helpers::{setup_test_app, TEST_API_KEY, TEST_INFLUENCER_ID, TEST_VOICE_ID};
use mockito::Matcher;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data["status"], "healthy");
}

#[tokio::test]
async fn test_create_video_sends_job_and_returns_task_id() {
    let mut app = setup_test_app().await;
    let mock = app
        .backend
        .mock("POST", "/moonxbt/create-influencer-video")
        .match_header("x-api-key", TEST_API_KEY)
        .match_body(Matcher::Json(json!({
            "projectData": {
                "name": "Moon",
                "description": "A project",
                "websiteUrl": "https://moon.test"
            },
            "cloudStorageService": true,
            "scrapeWebsite": true,
            "useCloudStorage": true,
            "influencerId": TEST_INFLUENCER_ID,
            "voiceId": TEST_VOICE_ID,
            "captureWebsite": true,
            "screenshotService": "screenshotmachine"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"taskId":"task-9"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/api/create-video")
        .json(&json!({
            "name": " Moon ",
            "description": "A project",
            "websiteUrl": "https://moon.test",
            "websiteDocUrl": ""
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data, json!({"message": "Video creation initiated", "taskId": "task-9"}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_video_requires_core_fields() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/create-video")
        .json(&json!({"name": "Moon"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert_eq!(data["error"], "Name, description and website URL are required");
}

#[tokio::test]
async fn test_create_video_rejects_invalid_doc_url() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/create-video")
        .json(&json!({
            "name": "Moon",
            "description": "A project",
            "websiteUrl": "https://moon.test",
            "websiteDocUrl": "docs"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert_eq!(data["error"], "Documentation URL is not valid");
}

#[tokio::test]
async fn test_create_video_backend_failure_is_500() {
    let mut app = setup_test_app().await;
    let _mock = app
        .backend
        .mock("POST", "/moonxbt/create-influencer-video")
        .with_status(500)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/api/create-video")
        .json(&json!({"name": "Moon", "description": "d", "websiteUrl": "https://moon.test"}))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: Value = response.json();
    assert_eq!(data["error"], "Failed to create promotional video");
}

#[tokio::test]
async fn test_check_video_status_forwards_task_id() {
    let mut app = setup_test_app().await;
    let mock = app
        .backend
        .mock("GET", "/moonxbt/task/task-9/status")
        .match_header("x-api-key", TEST_API_KEY)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"processing","progress":40}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .get("/api/check-video-status")
        .add_query_param("taskId", "task-9")
        .await;

    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data["status"], "processing");
    assert_eq!(data["progress"], 40);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_check_video_status_requires_task_id() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/check-video-status").await;

    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert_eq!(data["error"], "Task ID is required");
}

#[tokio::test]
async fn test_get_videos_forwards_influencer() {
    let mut app = setup_test_app().await;
    let mock = app
        .backend
        .mock("GET", "/a0x-framework/influencer-1/videos")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"videos":[{"id":"v1"}]}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .get("/api/get-videos")
        .add_query_param("influencerId", TEST_INFLUENCER_ID)
        .await;

    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data["videos"][0]["id"], "v1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_videos_requires_influencer_and_maps_failures() {
    let mut app = setup_test_app().await;

    let response = app.client().get("/api/get-videos").await;
    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert_eq!(data["error"], "Influencer ID is required");

    let _mock = app
        .backend
        .mock("GET", "/a0x-framework/missing/videos")
        .with_status(404)
        .create_async()
        .await;
    let response = app
        .client()
        .get("/api/get-videos")
        .add_query_param("influencerId", "missing")
        .await;
    assert_eq!(response.status_code(), 500);
    let data: Value = response.json();
    assert_eq!(data["error"], "Failed to fetch videos");
}
