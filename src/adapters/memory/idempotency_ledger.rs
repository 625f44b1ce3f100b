//! In-memory implementation of IdempotencyLedger.
//!
//! The check-and-set happens under a single write lock, which makes it atomic
//! within one process. Multiple instances need the Postgres ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::{
    stale_claim_cutoff, ApplyOutcome, ClaimState, IdempotencyKey, IdempotencyRecord,
    PaymentStatus, DEFAULT_CLAIM_TTL,
};
use crate::ports::IdempotencyLedger;

/// Process-local idempotency ledger.
pub struct InMemoryIdempotencyLedger {
    records: RwLock<HashMap<IdempotencyKey, IdempotencyRecord>>,
    claim_ttl: Duration,
}

impl Default for InMemoryIdempotencyLedger {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            claim_ttl: DEFAULT_CLAIM_TTL,
        }
    }
}

impl InMemoryIdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long an unconfirmed claim blocks other deliveries.
    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    /// Number of recorded keys.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn apply_if_new(&self, record: IdempotencyRecord) -> Result<ApplyOutcome, DomainError> {
        let stale_before = stale_claim_cutoff(self.claim_ttl);
        let mut records = self.records.write().await;
        let outcome = ApplyOutcome::decide(records.get(&record.key), &record, &stale_before);
        if outcome == ApplyOutcome::Applied {
            records.insert(record.key.clone(), record);
        }
        Ok(outcome)
    }

    async fn confirm(
        &self,
        key: &IdempotencyKey,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(key) {
            Some(record) if record.last_status == status && record.state == ClaimState::InProgress => {
                record.state = ClaimState::Applied;
                record.recorded_at = Timestamp::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(
        &self,
        key: &IdempotencyKey,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        match records.get(key) {
            Some(record) if record.last_status == status && record.state == ClaimState::InProgress => {
                records.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before_count = records.len();
        records.retain(|_, r| !r.recorded_at.is_before(&timestamp));
        Ok((before_count - records.len()) as u64)
    }
}
