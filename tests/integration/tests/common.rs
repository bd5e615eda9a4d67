//! Shared test environment.
//!
//! Spins up the composed router on an ephemeral port against the
//! in-memory provider and drives it with a real HTTP client.

use std::sync::Arc;

use warden_console::{ConsoleState, TracingAuditLogger};
use warden_model::{Roles, UserRecord};
use warden_provider::InMemoryProvider;
use warden_server::{create_router, AppState, ServerConfig};

/// A running server plus the handles the tests need.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client.
    pub client: reqwest::Client,
    /// The provider behind the server, for seeding and inspection.
    pub provider: Arc<InMemoryProvider>,
    /// Session token of the seeded admin operator.
    pub admin_token: String,
    /// Identifier of the seeded admin operator.
    pub admin_id: String,
}

impl TestEnv {
    /// Starts a server with one seeded admin account.
    pub async fn new() -> anyhow::Result<Self> {
        let provider = Arc::new(InMemoryProvider::new());
        let admin_id = provider.seed_user(
            UserRecord::new("")
                .with_name("Ada Admin")
                .with_email("admin@example.com")
                .with_roles(Roles::from_csv("admin")),
            "admin-pw",
        );
        let admin_token = provider.seed_session(&admin_id);

        let console = ConsoleState::new(
            provider.clone(),
            provider.clone(),
            Arc::new(TracingAuditLogger::new()),
        );
        let state = AppState::new(ServerConfig::for_testing(), console);
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            provider,
            admin_token,
            admin_id,
        })
    }

    /// Full URL for a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seeds a regular (non-admin) user and returns its identifier.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> String {
        self.provider.seed_user(
            UserRecord::new("")
                .with_name(name)
                .with_email(email)
                .with_roles(Roles::from_csv("user")),
            password,
        )
    }
}
