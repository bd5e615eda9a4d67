//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Base URL for the server (used in generated URLs).
    pub base_url: String,

    /// Base URL of the remote identity service's API.
    pub auth_service_url: String,

    /// Service key authenticating administrative calls.
    pub auth_service_key: String,

    /// CORS allowed origins (comma-separated).
    pub cors_origins: Vec<String>,

    /// Default page size of the directory listing.
    pub default_page_size: usize,

    /// Log level.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("WARDEN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("WARDEN_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let base_url = std::env::var("WARDEN_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let auth_service_url = std::env::var("AUTH_SERVICE_URL").map_err(|_| {
            anyhow::anyhow!("AUTH_SERVICE_URL environment variable is required")
        })?;

        let auth_service_key = std::env::var("AUTH_SERVICE_KEY").map_err(|_| {
            anyhow::anyhow!("AUTH_SERVICE_KEY environment variable is required")
        })?;

        let cors_origins = std::env::var("WARDEN_CORS_ORIGINS")
            .map(|s| s.split(',').map(str::trim).map(String::from).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let default_page_size = std::env::var("WARDEN_DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            base_url,
            auth_service_url,
            auth_service_key,
            cors_origins,
            default_page_size,
            log_level,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            base_url: "http://localhost:8080".to_string(),
            auth_service_url: "http://localhost:9000/api/auth".to_string(),
            auth_service_key: "test-service-key".to_string(),
            cors_origins: vec!["*".to_string()],
            default_page_size: 20,
            log_level: "debug".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            auth_service_url: "http://localhost:9000/api/auth".to_string(),
            auth_service_key: String::new(),
            cors_origins: vec!["*".to_string()],
            default_page_size: 20,
            log_level: "info".to_string(),
        }
    }
}
