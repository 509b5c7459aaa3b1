use serde::Deserialize;
use std::env;
use velo_common::error::{VeloError, VeloResult};

/// Server-level configuration. Upstream credentials are loaded separately
/// by each client config so that a missing upstream degrades to mock mode
/// instead of failing startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cache_ttl_secs: u64,
    pub mock_mode: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads vars with defaults.
    pub fn from_env() -> VeloResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: get_var_or("HOST", "0.0.0.0"),
            port: get_var_or("PORT", "8080")
                .parse()
                .map_err(|e| VeloError::Config(format!("invalid PORT: {e}")))?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            cache_ttl_secs: get_var_or("CACHE_TTL_SECS", "300")
                .parse()
                .map_err(|e| VeloError::Config(format!("invalid CACHE_TTL_SECS: {e}")))?,
            mock_mode: get_var_or("MOCK_MODE", "false")
                .parse()
                .map_err(|e| VeloError::Config(format!("invalid MOCK_MODE: {e}")))?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
