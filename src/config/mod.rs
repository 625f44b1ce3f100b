//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYMENT_CALLBACKS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use payment_callbacks::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod database;
mod dispatch;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use dispatch::{DispatchConfig, LedgerConfig};
pub use error::{ConfigError, ValidationError};
pub use payment::{verification_keys, DuitkuConfig, TripayConfig, XenditConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::domain::payment::VerificationKeys;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Built once at start-up; nothing downstream reads the environment again.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (optional PostgreSQL ledger)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Duitku callback configuration
    #[serde(default)]
    pub duitku: DuitkuConfig,

    /// Tripay callback configuration
    #[serde(default)]
    pub tripay: TripayConfig,

    /// Xendit webhook configuration
    #[serde(default)]
    pub xendit: XenditConfig,

    /// Downstream order-update dispatch
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Idempotency ledger retention
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMENT_CALLBACKS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMENT_CALLBACKS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYMENT_CALLBACKS__DUITKU__API_KEY=...` -> `duitku.api_key = ...`
    /// - `PAYMENT_CALLBACKS__XENDIT__MISSING_TOKEN_POLICY=reject`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_CALLBACKS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.xendit.validate()?;
        self.dispatch.validate()?;
        self.ledger.validate()?;
        // A claim that expires mid-dispatch would let a redelivery apply twice.
        if self.ledger.claim_ttl() <= self.dispatch.worst_case() {
            return Err(ValidationError::ClaimTtlShorterThanDispatch);
        }
        Ok(())
    }

    /// Signature verification keys for all providers
    pub fn verification_keys(&self) -> VerificationKeys {
        verification_keys(&self.duitku, &self.tripay, &self.xendit)
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::MissingTokenPolicy;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 9] = [
        "PAYMENT_CALLBACKS__DUITKU__MERCHANT_CODE",
        "PAYMENT_CALLBACKS__DUITKU__API_KEY",
        "PAYMENT_CALLBACKS__DUITKU__IP_ALLOWLIST_ENABLED",
        "PAYMENT_CALLBACKS__TRIPAY__PRIVATE_KEY",
        "PAYMENT_CALLBACKS__XENDIT__WEBHOOK_TOKEN",
        "PAYMENT_CALLBACKS__XENDIT__MISSING_TOKEN_POLICY",
        "PAYMENT_CALLBACKS__SERVER__PORT",
        "PAYMENT_CALLBACKS__SERVER__ENVIRONMENT",
        "PAYMENT_CALLBACKS__DATABASE__URL",
    ];

    /// Helper to set environment variables for testing
    fn set_minimal_env() {
        env::set_var("PAYMENT_CALLBACKS__DUITKU__MERCHANT_CODE", "D1234");
        env::set_var("PAYMENT_CALLBACKS__DUITKU__API_KEY", "secretkey");
        env::set_var("PAYMENT_CALLBACKS__TRIPAY__PRIVATE_KEY", "tripay-private");
        env::set_var("PAYMENT_CALLBACKS__XENDIT__WEBHOOK_TOKEN", "xendit-token");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.duitku.merchant_code.as_deref(), Some("D1234"));
        assert!(config.database.url().is_none());
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
        let keys = config.verification_keys();
        assert!(keys.duitku_api_key.is_some());
        assert!(keys.tripay_private_key.is_some());
        assert!(keys.xendit_webhook_token.is_some());
    }

    #[test]
    fn test_missing_xendit_token_needs_policy() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("PAYMENT_CALLBACKS__XENDIT__WEBHOOK_TOKEN");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::XenditTokenPolicyRequired)
        );
    }

    #[test]
    fn test_explicit_accept_policy() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("PAYMENT_CALLBACKS__XENDIT__WEBHOOK_TOKEN");
        env::set_var(
            "PAYMENT_CALLBACKS__XENDIT__MISSING_TOKEN_POLICY",
            "accept_unverified",
        );
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.verification_keys().xendit_missing_token_policy,
            MissingTokenPolicy::AcceptUnverified
        );
    }

    #[test]
    fn test_claim_ttl_must_outlast_dispatch() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let mut config = result.unwrap();
        config.ledger.claim_ttl_secs = 10;
        assert_eq!(
            config.validate(),
            Err(ValidationError::ClaimTtlShorterThanDispatch)
        );
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMENT_CALLBACKS__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_allowlist_flag_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMENT_CALLBACKS__DUITKU__IP_ALLOWLIST_ENABLED", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.duitku.source_allowlist().is_some());
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let debug = format!("{:?}", result.unwrap());
        assert!(!debug.contains("secretkey"));
        assert!(!debug.contains("tripay-private"));
        assert!(!debug.contains("xendit-token"));
    }
}
