//! Test helpers: a router wired to a mock backend.
//!
//! Run from workspace root: `cargo test -p moonxbt-api`.
//! Both the agent and the mirror backend point at the same mockito server.

use axum_test::TestServer;
use moonxbt_api::setup::routes;
use moonxbt_api::state::AppState;
use moonxbt_core::Config;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_INFLUENCER_ID: &str = "influencer-1";
pub const TEST_VOICE_ID: &str = "voice-1";

pub fn test_config(backend_url: &str) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        agent_api_url: backend_url.to_string(),
        agent_api_key: TEST_API_KEY.to_string(),
        mirror_api_url: backend_url.to_string(),
        influencer_id: TEST_INFLUENCER_ID.to_string(),
        voice_id: TEST_VOICE_ID.to_string(),
        request_timeout_secs: 5,
        rpc_url: "https://rpc.test".to_string(),
        auction_contract_address: None,
        token_contract_address: None,
    }
}

/// Test application: the proxy under test and its mock backend.
pub struct TestApp {
    pub server: TestServer,
    pub backend: mockito::ServerGuard,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub async fn setup_test_app() -> TestApp {
    let backend = mockito::Server::new_async().await;
    let config = test_config(&backend.url());
    let state = AppState::from_config(config.clone()).expect("Failed to build state");
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, backend }
}
