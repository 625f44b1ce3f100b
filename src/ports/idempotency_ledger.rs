//! IdempotencyLedger port - At-most-once application of terminal statuses.
//!
//! Providers retry callbacks on timeouts and non-2xx responses, and may
//! deliver the same notification concurrently. The ledger is the only shared
//! mutable state in the callback pipeline, so `apply_if_new` must be an atomic
//! check-and-set: a read followed by a separate write would let two concurrent
//! deliveries both observe "not yet applied".
//!
//! A claim is written in-progress before the order update and confirmed after
//! it, so a concurrent duplicate never reports success for an update that may
//! still fail.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::{ApplyOutcome, IdempotencyKey, IdempotencyRecord, PaymentStatus};

/// Port for recording which provider transactions have been applied.
///
/// Implementations should use a uniqueness constraint on
/// `(provider, external_reference)` rather than application-level locking
/// when the store is shared between processes.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Atomically claims `record` unless its key is already present.
    ///
    /// Returns `Applied` if this call now holds the claim, `AlreadyApplied`
    /// if the same status was confirmed, `InProgress` if another delivery
    /// holds a live claim for it, or `Conflict` if a different status is
    /// recorded. A conflicting record is never overwritten.
    async fn apply_if_new(&self, record: IdempotencyRecord) -> Result<ApplyOutcome, DomainError>;

    /// Marks an in-progress claim as applied once its order update succeeded.
    ///
    /// Returns true if a claim with `status` was confirmed.
    async fn confirm(&self, key: &IdempotencyKey, status: PaymentStatus)
        -> Result<bool, DomainError>;

    /// Removes a claim whose downstream application failed, so a provider
    /// retry can apply it again.
    ///
    /// Only deletes an in-progress claim that still holds `status`. Returns
    /// true if a record was removed.
    async fn release(&self, key: &IdempotencyKey, status: PaymentStatus)
        -> Result<bool, DomainError>;

    /// Finds the record for a key.
    async fn find(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, DomainError>;

    /// Delete records recorded before the timestamp.
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
