//! # Warden Server
//!
//! Main entry point for the Warden admin console.

#![forbid(unsafe_code)]
#![deny(warnings)]

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use warden_console::{ConsoleState, TracingAuditLogger};
use warden_provider_http::HttpProvider;
use warden_server::{create_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        auth_service_url = %config.auth_service_url,
        "Warden starting..."
    );

    let base_url = Url::parse(&config.auth_service_url)?;
    let provider = Arc::new(HttpProvider::new(base_url, config.auth_service_key.clone()));

    let console = ConsoleState::new(
        provider.clone(),
        provider,
        Arc::new(TracingAuditLogger::new()),
    );
    let state = AppState::new(config.clone(), console);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Warden listening");

    axum::serve(listener, app).await?;
    Ok(())
}
