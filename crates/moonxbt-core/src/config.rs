//! Configuration module
//!
//! Environment-driven settings for the proxy server and the client tools:
//! backend endpoints and credentials, CORS, timeouts and on-chain addresses.

use std::env;

const SERVER_PORT: u16 = 3000;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MIRROR_API_URL: &str = "http://localhost:3001";
const RPC_URL: &str = "https://mainnet.base.org";
const INFLUENCER_ID: &str = "3e444822-7a6c-0e5d-a36d-7087fb23685b";
const VOICE_ID: &str = "L4ndSW2PzthljqHuvso3";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Base URL of the agent backend (airdrop, video and task routes).
    pub agent_api_url: String,
    /// Value sent as `x-api-key` to the agent backend.
    pub agent_api_key: String,
    /// Base URL of the mirror backend that signs asset URLs.
    pub mirror_api_url: String,
    pub influencer_id: String,
    pub voice_id: String,
    pub request_timeout_secs: u64,
    // On-chain configuration
    pub rpc_url: String,
    pub auction_contract_address: Option<String>,
    pub token_contract_address: Option<String>,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            agent_api_url: env::var("A0X_AGENT_API_URL")
                .map_err(|_| anyhow::anyhow!("A0X_AGENT_API_URL must be set"))?
                .trim_end_matches('/')
                .to_string(),
            agent_api_key: env::var("A0X_AGENT_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .map_err(|_| anyhow::anyhow!("A0X_AGENT_API_KEY or API_KEY must be set"))?,
            mirror_api_url: env::var("A0X_MIRROR_API_URL")
                .unwrap_or_else(|_| MIRROR_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            influencer_id: env::var("INFLUENCER_ID").unwrap_or_else(|_| INFLUENCER_ID.to_string()),
            voice_id: env::var("VOICE_ID").unwrap_or_else(|_| VOICE_ID.to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(REQUEST_TIMEOUT_SECS)
                .max(1),
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| RPC_URL.to_string()),
            auction_contract_address: env::var("AUCTION_CONTRACT_ADDRESS").ok(),
            token_contract_address: env::var("TOKEN_CONTRACT_ADDRESS").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        for (name, value) in [
            ("A0X_AGENT_API_URL", &self.agent_api_url),
            ("A0X_MIRROR_API_URL", &self.mirror_api_url),
            ("RPC_URL", &self.rpc_url),
        ] {
            if !crate::validation::is_valid_url(value) {
                return Err(anyhow::anyhow!("{} must be an absolute http(s) URL", name));
            }
        }

        if self.agent_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("A0X_AGENT_API_KEY must not be empty"));
        }

        Ok(())
    }
}
