use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;
use crate::validation::validate_expires_in;

/// Default lifetime requested for a signed URL, in seconds.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// A request for a time-limited URL to `file_path` inside `bucket_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest {
    pub bucket_name: String,
    pub file_path: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

impl AssetRequest {
    pub fn new(bucket_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            file_path: file_path.into(),
            expires_in: DEFAULT_EXPIRES_IN_SECS,
        }
    }

    pub fn with_expires_in(mut self, expires_in: u64) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::new(&self.bucket_name, &self.file_path)
    }
}

/// Cache key for an asset, rendered as `bucket:path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub bucket_name: String,
    pub file_path: String,
}

impl AssetKey {
    pub fn new(bucket_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            file_path: file_path.into(),
        }
    }
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.bucket_name, self.file_path)
    }
}

/// A signed URL together with the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAsset {
    pub signed_url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedAsset {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Observable state of one cache entry.
///
/// `signed_url` and `expires_at` are either both set or both empty, except after a
/// failed background refresh, which keeps the previous pair and records `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetState {
    pub signed_url: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AssetState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn ready(asset: &SignedAsset) -> Self {
        Self {
            signed_url: Some(asset.signed_url.clone()),
            is_loading: false,
            error: None,
            expires_at: Some(asset.expires_at),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// The cached asset, if one is present and still valid at `now`.
    pub fn valid_asset(&self, now: DateTime<Utc>) -> Option<SignedAsset> {
        match (&self.signed_url, self.expires_at) {
            (Some(url), Some(expires_at)) if now < expires_at => Some(SignedAsset {
                signed_url: url.clone(),
                expires_at,
            }),
            _ => None,
        }
    }
}

/// Body or query of `/api/assets/signed-url`. Fields are optional so that a
/// missing value produces a field-specific 400 instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlParams {
    pub bucket_name: Option<String>,
    pub file_path: Option<String>,
    pub expires_in: Option<i64>,
}

impl SignedUrlParams {
    pub fn into_request(self) -> Result<AssetRequest, AppError> {
        let bucket_name = self.bucket_name.filter(|s| !s.is_empty());
        let file_path = self.file_path.filter(|s| !s.is_empty());
        let (Some(bucket_name), Some(file_path)) = (bucket_name, file_path) else {
            return Err(AppError::BadRequest(
                "Missing required fields: bucketName and filePath".to_string(),
            ));
        };
        let expires_in =
            validate_expires_in(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS as i64))?;
        Ok(AssetRequest {
            bucket_name,
            file_path,
            expires_in,
        })
    }
}

/// Backend answer from the signing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSignedUrl {
    pub signed_url: String,
}

/// Response of `/api/assets/signed-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAssetUrlResponse {
    pub signed_url: String,
    pub original_path: String,
    pub expires_at: DateTime<Utc>,
}

impl From<SignedAssetUrlResponse> for SignedAsset {
    fn from(response: SignedAssetUrlResponse) -> Self {
        SignedAsset {
            signed_url: response.signed_url,
            expires_at: response.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn key_renders_bucket_and_path() {
        let key = AssetRequest::new("media", "videos/a.mp4").key();
        assert_eq!(key.to_string(), "media:videos/a.mp4");
    }

    #[test]
    fn request_defaults_expiry() {
        let req: AssetRequest =
            serde_json::from_str(r#"{"bucketName":"b","filePath":"p"}"#).unwrap();
        assert_eq!(req.expires_in, DEFAULT_EXPIRES_IN_SECS);
    }

    #[test]
    fn valid_asset_respects_expiry() {
        let now = Utc::now();
        let state = AssetState::ready(&SignedAsset {
            signed_url: "https://cdn.test/a".to_string(),
            expires_at: now + Duration::seconds(10),
        });
        assert!(state.valid_asset(now).is_some());
        assert!(state.valid_asset(now + Duration::seconds(10)).is_none());
        assert!(AssetState::loading().valid_asset(now).is_none());
    }

    #[test]
    fn params_require_bucket_and_path() {
        let err = SignedUrlParams {
            bucket_name: Some("b".to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap_err();
        assert!(err.to_string().contains("bucketName and filePath"));
    }

    #[test]
    fn params_reject_out_of_range_expiry() {
        let params = SignedUrlParams {
            bucket_name: Some("b".to_string()),
            file_path: Some("p".to_string()),
            expires_in: Some(30),
        };
        assert!(params.into_request().is_err());
    }

    #[test]
    fn response_parses_rfc3339_expiry() {
        let body = r#"{"signedUrl":"https://cdn.test/x","originalPath":"x","expiresAt":"2030-01-01T00:00:00.000Z"}"#;
        let response: SignedAssetUrlResponse = serde_json::from_str(body).unwrap();
        let asset = SignedAsset::from(response);
        assert_eq!(asset.expires_at.to_rfc3339(), "2030-01-01T00:00:00+00:00");
    }
}
