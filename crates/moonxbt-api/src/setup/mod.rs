//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use moonxbt_core::Config;
use moonxbt_infra::{init_telemetry, LogFormat};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    init_telemetry("moonxbt-api", &config.environment, LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        agent_api_url = %config.agent_api_url,
        mirror_api_url = %config.mirror_api_url,
        "Configuration loaded and validated successfully"
    );

    let state = AppState::from_config(config.clone())?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
