use async_trait::async_trait;
use moonxbt_api_client::ApiClient;
use moonxbt_core::models::{SubmitResponse, TaskStatusResponse};
use serde_json::Value;

use super::{PollError, TaskBackend};

/// Status route used when none is configured. `{ticket}` is replaced by the
/// URL-encoded ticket id.
pub const DEFAULT_STATUS_PATH: &str = "/api/async-status/{ticket}";

/// [`TaskBackend`] over HTTP: submissions are POSTed as JSON to the endpoint,
/// status is read with a GET on the status path.
#[derive(Clone, Debug)]
pub struct HttpTaskBackend {
    client: ApiClient,
    status_path: String,
}

impl HttpTaskBackend {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            status_path: DEFAULT_STATUS_PATH.to_string(),
        }
    }

    /// Use another status route, e.g. `/api/check-video-status?taskId={ticket}`.
    pub fn with_status_path(mut self, status_path: impl Into<String>) -> Self {
        self.status_path = status_path.into();
        self
    }

    fn status_url_path(&self, ticket_id: &str) -> String {
        self.status_path
            .replace("{ticket}", &urlencoding::encode(ticket_id))
    }
}

#[async_trait]
impl TaskBackend for HttpTaskBackend {
    async fn submit(&self, endpoint: &str, payload: &Value) -> Result<SubmitResponse, PollError> {
        let body: Value = self
            .client
            .post_json(endpoint, payload)
            .await
            .map_err(|e| PollError::Request(format!("{:#}", e)))?;
        SubmitResponse::from_value(body).map_err(|e| PollError::InvalidResponse(e.to_string()))
    }

    async fn status(&self, ticket_id: &str) -> Result<TaskStatusResponse, PollError> {
        self.client
            .get(&self.status_url_path(ticket_id), &[])
            .await
            .map_err(|e| PollError::Request(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonxbt_api_client::Auth;
    use moonxbt_core::models::RequestStatus;

    fn backend(url: String) -> HttpTaskBackend {
        HttpTaskBackend::new(ApiClient::new(url, Auth::None).unwrap())
    }

    #[test]
    fn status_path_encodes_ticket() {
        let backend = backend("http://localhost:3000".to_string())
            .with_status_path("/api/check-video-status?taskId={ticket}");
        assert_eq!(
            backend.status_url_path("a b/c"),
            "/api/check-video-status?taskId=a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn submit_detects_ticket() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/create-video")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isAsync":true,"ticketId":"t1","status":"pending"}"#)
            .create_async()
            .await;

        let response = backend(server.url())
            .submit("/api/create-video", &serde_json::json!({"name": "moon"}))
            .await
            .unwrap();
        match response {
            SubmitResponse::Async(ticket) => assert_eq!(ticket.ticket_id, "t1"),
            other => panic!("expected a ticket, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn status_reads_default_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/async-status/t1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"processing","progress":40}"#)
            .create_async()
            .await;

        let status = backend(server.url()).status("t1").await.unwrap();
        assert_eq!(status.status, RequestStatus::Processing);
        assert_eq!(status.progress_percent(), 40);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/async-status/t1")
            .with_status(500)
            .create_async()
            .await;

        let err = backend(server.url()).status("t1").await.unwrap_err();
        assert!(matches!(err, PollError::Request(_)));
    }
}
