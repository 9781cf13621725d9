//! Configuration module - environment-based configuration.

use std::env;

/// Server configuration loaded from environment variables.
///
/// The `max_execution_steps`, `max_wait_seconds`, and `code_timeout_seconds`
/// fields are read for completeness and surfaced on `/health`, but are not
/// yet wired into the engine/executor's compile-time bounds
/// (`n8n_core::engine::MAX_EXECUTION_STEPS`, the Wait node's clamp, and
/// `n8n_core::code_sandbox::CODE_TIMEOUT`) — making those runtime-overridable
/// would require threading the values through `RuntimeConfig` instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub max_execution_steps: usize,
    pub max_wait_seconds: u64,
    pub code_timeout_seconds: u64,

    pub credentials_encryption_key: Option<String>,
    pub google_ai_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("N8N_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("N8N_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Self {
            host,
            port,
            max_execution_steps: env::var("N8N_MAX_EXECUTION_STEPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(n8n_core::engine::MAX_EXECUTION_STEPS),
            max_wait_seconds: env::var("N8N_MAX_WAIT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            code_timeout_seconds: env::var("N8N_CODE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(n8n_core::code_sandbox::CODE_TIMEOUT.as_secs()),
            credentials_encryption_key: env::var("CREDENTIALS_ENCRYPTION_KEY").ok(),
            google_ai_api_key: env::var("GOOGLE_AI_API_KEY").ok(),
        }
    }

    /// Get server bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
