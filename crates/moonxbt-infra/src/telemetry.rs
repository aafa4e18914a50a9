//! Tracing initialization
//!
//! The server logs through an `EnvFilter`-driven subscriber, either human-readable
//! or JSON. The CLI uses a plain formatter at `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_SERVER_FILTER: &str = "moonxbt=debug,tower_http=debug";

/// Output format of the server logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").map(|s| s.to_lowercase()) {
            Ok(s) if s == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize tracing for the server. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(
    service_name: &str,
    environment: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_SERVER_FILTER.into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?,
    }

    tracing::info!(service = service_name, environment, "Tracing initialized");
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
