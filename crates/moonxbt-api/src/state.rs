//! Application state shared by the route handlers.

use anyhow::Result;
use moonxbt_api_client::{ApiClient, Auth};
use moonxbt_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Clients for the two backends the proxy forwards to.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    /// Agent backend, authenticated with `x-api-key`.
    pub agent: ApiClient,
    /// Mirror backend that signs asset URLs. No credentials.
    pub mirror: ApiClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Arc<Self>> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let agent = ApiClient::with_timeout(
            config.agent_api_url.clone(),
            Auth::XApiKey(config.agent_api_key.clone()),
            timeout,
        )?;
        let mirror = ApiClient::with_timeout(config.mirror_api_url.clone(), Auth::None, timeout)?;

        Ok(Arc::new(Self {
            config,
            agent,
            mirror,
        }))
    }
}
