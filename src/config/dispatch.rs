//! Downstream dispatch and ledger retention configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::DispatchPolicy;

use super::error::ValidationError;

/// Order-update dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Timeout for a single order update in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts before a callback is reported as a downstream failure
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles per retry
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

impl DispatchConfig {
    pub fn policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
        }
    }

    /// Validate dispatch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(ValidationError::InvalidDispatchTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidDispatchAttempts);
        }
        if self.base_backoff_ms == 0 || self.base_backoff_ms > 10_000 {
            return Err(ValidationError::InvalidDispatchBackoff);
        }
        Ok(())
    }

    /// Longest a dispatch can take with every attempt timing out
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let timeouts = self.timeout_ms.saturating_mul(u64::from(attempts));
        // backoff doubles between attempts: base * (2^(attempts-1) - 1)
        let doublings = 1u64.checked_shl(attempts - 1).unwrap_or(u64::MAX);
        let backoffs = self.base_backoff_ms.saturating_mul(doublings - 1);
        Duration::from_millis(timeouts.saturating_add(backoffs))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}

/// Idempotency ledger retention
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Records older than this are deleted
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Seconds between cleanup runs
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Seconds before an unconfirmed claim may be taken over by a redelivery
    #[serde(default = "default_claim_ttl")]
    pub claim_ttl_secs: u64,
}

impl LedgerConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn claim_ttl(&self) -> Duration {
        Duration::from_secs(self.claim_ttl_secs)
    }

    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention_days == 0 || self.cleanup_interval_secs == 0 {
            return Err(ValidationError::InvalidRetention);
        }
        if self.claim_ttl_secs == 0 || self.claim_ttl_secs > 86_400 {
            return Err(ValidationError::InvalidClaimTtl);
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cleanup_interval_secs: default_cleanup_interval(),
            claim_ttl_secs: default_claim_ttl(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    200
}

fn default_retention_days() -> u32 {
    90
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_claim_ttl() -> u64 {
    300
}
