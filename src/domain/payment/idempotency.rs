//! Idempotency keys, ledger records and the claim decision.
//!
//! The ledger holds one record per `(provider, external_reference)`. Only
//! terminal statuses are recorded. A record starts as an in-progress claim
//! taken before the order update and is confirmed once the update succeeded,
//! so a delivery arriving in between can tell "being applied" from "applied".
//! A record's status is never overwritten: a second delivery either repeats it
//! or contradicts it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

use super::event::NormalizedEvent;
use super::provider::Provider;
use super::status::PaymentStatus;

/// Claims older than this are taken over by the next delivery.
pub const DEFAULT_CLAIM_TTL: Duration = Duration::from_secs(300);

// Keeps the chrono conversion in range for absurd configured values.
const MAX_CLAIM_TTL_SECS: i64 = 100 * 365 * 86_400;

/// Claims taken before the returned time are stale.
pub fn stale_claim_cutoff(ttl: Duration) -> Timestamp {
    let secs = i64::try_from(ttl.as_secs())
        .unwrap_or(MAX_CLAIM_TTL_SECS)
        .min(MAX_CLAIM_TTL_SECS);
    Timestamp::now().minus_secs(secs)
}

/// Ledger key identifying one provider transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    provider: Provider,
    external_reference: String,
}

impl IdempotencyKey {
    pub fn new(provider: Provider, external_reference: impl Into<String>) -> Self {
        Self {
            provider,
            external_reference: external_reference.into(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn external_reference(&self) -> &str {
        &self.external_reference
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.external_reference)
    }
}

/// Whether a recorded status has reached order state yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    /// Claimed by a delivery whose order update has not finished.
    InProgress,
    /// The order update succeeded.
    Applied,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimState::InProgress => "in_progress",
            ClaimState::Applied => "applied",
        }
    }
}

impl FromStr for ClaimState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ClaimState::InProgress),
            "applied" => Ok(ClaimState::Applied),
            other => Err(format!("unknown claim state: {}", other)),
        }
    }
}

/// A terminal status claimed or applied for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub internal_order_id: String,
    pub last_status: PaymentStatus,
    pub state: ClaimState,
    /// When the claim was taken, or when it was confirmed.
    pub recorded_at: Timestamp,
}

impl IdempotencyRecord {
    /// Builds the in-progress claim an event would write.
    ///
    /// Returns `None` for non-terminal events, which are never recorded.
    pub fn from_event(event: &NormalizedEvent) -> Option<Self> {
        if !event.status().is_terminal() {
            return None;
        }
        Some(Self {
            key: event.idempotency_key(),
            internal_order_id: event.internal_order_id().to_string(),
            last_status: event.status(),
            state: ClaimState::InProgress,
            recorded_at: Timestamp::now(),
        })
    }

    /// True for an in-progress claim taken before `stale_before`. Its owner is
    /// assumed to have died mid-update.
    pub fn is_stale_claim(&self, stale_before: &Timestamp) -> bool {
        self.state == ClaimState::InProgress && self.recorded_at.is_before(stale_before)
    }
}

/// Result of `apply_if_new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// This delivery now holds the claim and must apply it.
    Applied,
    /// The same terminal status was already applied.
    AlreadyApplied,
    /// Another delivery holds an unconfirmed claim for the same status.
    InProgress,
    /// A different terminal status is recorded; nothing was written.
    Conflict { recorded: PaymentStatus },
}

impl ApplyOutcome {
    /// Decides the outcome of claiming `incoming` given what is stored.
    ///
    /// A same-status claim older than `stale_before` is taken over. Ledger
    /// implementations call this inside their atomic section.
    pub fn decide(
        existing: Option<&IdempotencyRecord>,
        incoming: &IdempotencyRecord,
        stale_before: &Timestamp,
    ) -> Self {
        match existing {
            None => ApplyOutcome::Applied,
            Some(record) if record.last_status != incoming.last_status => {
                ApplyOutcome::Conflict {
                    recorded: record.last_status,
                }
            }
            Some(record) if record.state == ClaimState::Applied => ApplyOutcome::AlreadyApplied,
            Some(record) if record.is_stale_claim(stale_before) => ApplyOutcome::Applied,
            Some(_) => ApplyOutcome::InProgress,
        }
    }
}
