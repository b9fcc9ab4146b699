//! HTTP server configuration.

/// Bind address and HTTP-level timeouts.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request timeout. Must comfortably exceed the admission
    /// timeout plus the job budget, or long generations are cut off at
    /// the HTTP layer with the backend still working.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default   |
    /// |---------------------------------|-----------|
    /// | `MEDIAGEN_HOST`                 | `0.0.0.0` |
    /// | `MEDIAGEN_PORT`                 | `3000`    |
    /// | `MEDIAGEN_REQUEST_TIMEOUT_SECS` | `300`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("MEDIAGEN_HOST").unwrap_or(defaults.host),
            port: std::env::var("MEDIAGEN_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            request_timeout_secs: std::env::var("MEDIAGEN_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}
