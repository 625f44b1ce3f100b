//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host address")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Xendit webhook token is not set; set xendit.missing_token_policy to reject or accept_unverified")]
    XenditTokenPolicyRequired,

    #[error("Invalid dispatch timeout")]
    InvalidDispatchTimeout,

    #[error("Dispatch max_attempts must be between 1 and 10")]
    InvalidDispatchAttempts,

    #[error("Dispatch base_backoff_ms must be between 1 and 10000")]
    InvalidDispatchBackoff,

    #[error("Ledger retention must be at least one day")]
    InvalidRetention,

    #[error("Ledger claim_ttl_secs must be between 1 and 86400")]
    InvalidClaimTtl,

    #[error("Ledger claim_ttl_secs must exceed the longest possible dispatch")]
    ClaimTtlShorterThanDispatch,
}
