//! API configuration
//!
//! Every field has a default; `API_`-prefixed environment variables override
//! them (`API_PORT=9000`, `API_JWT_ACCESS_SECRET=...`). The binary loads a
//! `.env` file with `dotenvy` before calling [`ApiConfig::load`].

use serde::Deserialize;
use std::time::Duration;

use domain_claims::ClaimApprovalMode;

/// Start of the placeholder JWT secrets shipped as defaults
const DEFAULT_SECRET_PREFIX: &str = "change-me-";

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Upper bound of pooled connections
    pub db_max_connections: u32,
    /// Connections kept open while idle
    pub db_min_connections: u32,
    /// Wait for a free connection before a request fails, in seconds
    pub db_acquire_timeout_secs: u64,
    /// Idle connections above the minimum are closed after this, in seconds
    pub db_idle_timeout_secs: u64,
    /// Connections are recycled after this, in seconds
    pub db_max_lifetime_secs: u64,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Secret signing access tokens
    pub jwt_access_secret: String,
    /// Secret signing refresh tokens, distinct from the access secret
    pub jwt_refresh_secret: String,
    /// Access token lifetime in minutes
    pub jwt_access_expiry_mins: i64,
    /// Refresh token lifetime in days
    pub jwt_refresh_expiry_days: i64,
    /// Upper bound for one request, in seconds
    pub request_timeout_secs: u64,
    /// Directory uploads are written to
    pub upload_dir: String,
    /// Public URL prefix under which `upload_dir` is served
    pub upload_base_url: String,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,
    /// Initial password of the login created with every shop
    pub default_shop_password: String,
    /// How claim approvals are recorded
    pub claim_approval_mode: ClaimApprovalMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/warranty".to_string(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 30,
            db_idle_timeout_secs: 10 * 60,
            db_max_lifetime_secs: 30 * 60,
            log_level: "info".to_string(),
            jwt_access_secret: format!("{DEFAULT_SECRET_PREFIX}access"),
            jwt_refresh_secret: format!("{DEFAULT_SECRET_PREFIX}refresh"),
            jwt_access_expiry_mins: 15,
            jwt_refresh_expiry_days: 7,
            request_timeout_secs: 30,
            upload_dir: "./uploads".to_string(),
            upload_base_url: "http://localhost:8080/uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            default_shop_password: "password@profilm".to_string(),
            claim_approval_mode: ClaimApprovalMode::TriState,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from defaults overridden by the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = ApiConfig::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port)?
            .set_default("database_url", defaults.database_url)?
            .set_default("db_max_connections", defaults.db_max_connections)?
            .set_default("db_min_connections", defaults.db_min_connections)?
            .set_default("db_acquire_timeout_secs", defaults.db_acquire_timeout_secs)?
            .set_default("db_idle_timeout_secs", defaults.db_idle_timeout_secs)?
            .set_default("db_max_lifetime_secs", defaults.db_max_lifetime_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("jwt_access_secret", defaults.jwt_access_secret)?
            .set_default("jwt_refresh_secret", defaults.jwt_refresh_secret)?
            .set_default("jwt_access_expiry_mins", defaults.jwt_access_expiry_mins)?
            .set_default("jwt_refresh_expiry_days", defaults.jwt_refresh_expiry_days)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("upload_dir", defaults.upload_dir)?
            .set_default("upload_base_url", defaults.upload_base_url)?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as u64)?
            .set_default("default_shop_password", defaults.default_shop_password)?
            .set_default("claim_approval_mode", defaults.claim_approval_mode.as_str())?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn db_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.db_idle_timeout_secs)
    }

    pub fn db_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.db_max_lifetime_secs)
    }

    /// Whether either JWT secret is still a shipped placeholder
    pub fn uses_default_jwt_secrets(&self) -> bool {
        self.jwt_access_secret.starts_with(DEFAULT_SECRET_PREFIX)
            || self.jwt_refresh_secret.starts_with(DEFAULT_SECRET_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.jwt_access_expiry_mins, 15);
        assert_eq!(config.jwt_refresh_expiry_days, 7);
        assert_ne!(config.jwt_access_secret, config.jwt_refresh_secret);
        assert_eq!(config.claim_approval_mode, ClaimApprovalMode::TriState);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.db_acquire_timeout(), Duration::from_secs(30));
        assert_eq!(config.db_idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.db_max_lifetime(), Duration::from_secs(1800));
    }

    #[test]
    fn test_placeholder_secrets_are_detected() {
        let mut config = ApiConfig::default();
        assert!(config.uses_default_jwt_secrets());

        config.jwt_access_secret = "a3f9c1d27e".into();
        assert!(config.uses_default_jwt_secrets());

        config.jwt_refresh_secret = "77b0e4aa19".into();
        assert!(!config.uses_default_jwt_secrets());
    }
}
