//! Shared HTTP client for MoonXBT.
//!
//! One client type talks to both sides of the proxy: the public `/api/*` routes
//! ([`api`]) and the agent/mirror backends the proxy forwards to ([`backend`]).
//! Auth is configurable (X-API-Key for the backend, none for the public routes).

pub mod api;
pub mod backend;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// No credentials (public proxy routes).
    None,
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `x-api-key: {key}`
    XApiKey(String),
}

/// A non-success HTTP answer. Wrapped in `anyhow::Error`; callers that need the
/// status code recover it with [`status_of`].
#[derive(Debug, thiserror::Error)]
#[error("API request failed with status {status}: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

impl HttpStatusError {
    /// Parsed JSON body, if the server sent one.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// HTTP status carried by an error produced by [`ApiClient`], if any.
pub fn status_of(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<HttpStatusError>().map(|e| e.status)
}

/// HTTP client with a base URL and configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        Self::with_timeout(base_url, auth, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Client for the public proxy routes: MOONXBT_API_URL (or API_URL), no auth.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MOONXBT_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self::new(base_url, Auth::None)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("x-api-key", key.as_str()),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!(status = status.as_u16(), "API request returned error status");
            return Err(HttpStatusError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = self.send(request).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).json(body);

        let response = self.send(request).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }
}
