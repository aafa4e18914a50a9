use crate::error::{ApiJson, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use chrono::{Duration, Utc};
use moonxbt_api_client::{status_of, HttpStatusError};
use moonxbt_core::models::{AssetRequest, SignedAssetUrlResponse, SignedUrlParams};
use moonxbt_core::AppError;
use std::sync::Arc;

/// Sign an asset URL; parameters in the JSON body.
#[tracing::instrument(skip(state, params))]
pub async fn signed_url_post(
    State(state): State<Arc<AppState>>,
    ApiJson(params): ApiJson<SignedUrlParams>,
) -> Result<Json<SignedAssetUrlResponse>, HttpAppError> {
    let request = params.into_request()?;
    tracing::debug!(bucket = %request.bucket_name, path = %request.file_path, "Signing asset URL");

    let signed = state
        .mirror
        .sign_asset(&request)
        .await
        .map_err(signing_error)?;

    Ok(Json(signed_response(&request, signed.signed_url)))
}

/// Sign an asset URL; parameters in the query string.
#[tracing::instrument(skip(state, query))]
pub async fn signed_url_get(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SignedUrlParams>, QueryRejection>,
) -> Result<Json<SignedAssetUrlResponse>, HttpAppError> {
    let Query(params) = query?;
    let request = params.into_request()?;
    tracing::debug!(bucket = %request.bucket_name, path = %request.file_path, "Signing asset URL");

    let signed = state
        .mirror
        .sign_asset_by_query(&request)
        .await
        .map_err(signing_error)?;

    Ok(Json(signed_response(&request, signed.signed_url)))
}

fn signed_response(request: &AssetRequest, signed_url: String) -> SignedAssetUrlResponse {
    SignedAssetUrlResponse {
        signed_url,
        original_path: request.file_path.clone(),
        expires_at: Utc::now() + Duration::seconds(request.expires_in as i64),
    }
}

/// Map a failed signing call. Status answers from the backend pass through;
/// anything else is an internal error.
fn signing_error(err: anyhow::Error) -> AppError {
    match status_of(&err) {
        Some(404) => AppError::Upstream {
            status: 404,
            message: "Asset not found".to_string(),
            details: Some("The requested file does not exist".to_string()),
        },
        Some(403) => AppError::Upstream {
            status: 403,
            message: "Access denied".to_string(),
            details: Some("Insufficient permissions to access the file".to_string()),
        },
        Some(status) => {
            let details = err
                .downcast_ref::<HttpStatusError>()
                .and_then(HttpStatusError::json_body)
                .and_then(|body| {
                    ["error", "details"]
                        .iter()
                        .find_map(|field| body.get(*field).and_then(|v| v.as_str()).map(String::from))
                })
                .unwrap_or_else(|| "Unknown backend error".to_string());
            AppError::Upstream {
                status,
                message: "Failed to get signed URL".to_string(),
                details: Some(details),
            }
        }
        None => AppError::from(err),
    }
}
