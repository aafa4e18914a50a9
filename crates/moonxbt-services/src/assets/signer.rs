use async_trait::async_trait;
use moonxbt_api_client::{ApiClient, HttpStatusError};
use moonxbt_core::models::{AssetRequest, SignedAsset};
use serde_json::Value;

use super::AssetError;

/// Source of signed URLs.
#[async_trait]
pub trait AssetSigner: Send + Sync {
    async fn sign(&self, request: &AssetRequest) -> Result<SignedAsset, AssetError>;
}

/// Signs assets through the proxy's `/api/assets/signed-url` route.
#[derive(Clone, Debug)]
pub struct HttpAssetSigner {
    client: ApiClient,
}

impl HttpAssetSigner {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetSigner for HttpAssetSigner {
    async fn sign(&self, request: &AssetRequest) -> Result<SignedAsset, AssetError> {
        self.client
            .request_signed_url(request)
            .await
            .map(SignedAsset::from)
            .map_err(|err| AssetError::Signing(describe(&err)))
    }
}

/// Short reason for a failed signing call: the proxy's `error` field when it sent
/// one, otherwise the status or transport error.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<HttpStatusError>() {
        Some(http) => http
            .json_body()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("status {}", http.status)),
        None => format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonxbt_api_client::Auth;

    #[tokio::test]
    async fn signs_through_proxy_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/assets/signed-url")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "bucketName": "media",
                "filePath": "a.png",
                "expiresIn": 3600
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"signedUrl":"https://cdn.test/a.png?sig=1","originalPath":"a.png","expiresAt":"2030-01-01T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let signer = HttpAssetSigner::new(ApiClient::new(server.url(), Auth::None).unwrap());
        let asset = signer.sign(&AssetRequest::new("media", "a.png")).await.unwrap();
        assert_eq!(asset.signed_url, "https://cdn.test/a.png?sig=1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_proxy_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/assets/signed-url")
            .with_status(400)
            .with_body(r#"{"error":"Missing required fields: bucketName and filePath"}"#)
            .create_async()
            .await;

        let signer = HttpAssetSigner::new(ApiClient::new(server.url(), Auth::None).unwrap());
        let err = signer.sign(&AssetRequest::new("", "")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get signed URL: Missing required fields: bucketName and filePath"
        );
    }
}
