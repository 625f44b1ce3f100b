//! PostgreSQL implementation of IdempotencyLedger.
//!
//! The primary key on `(provider, external_reference)` makes the claim atomic
//! across processes: `INSERT .. ON CONFLICT DO NOTHING` writes a row for
//! exactly one of any number of concurrent deliveries. Taking over a stale
//! claim is a conditional `UPDATE` on the claim's original timestamp, so only
//! one delivery can win that too.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::payment::{
    stale_claim_cutoff, ApplyOutcome, ClaimState, IdempotencyKey, IdempotencyRecord,
    PaymentStatus, Provider, DEFAULT_CLAIM_TTL,
};
use crate::ports::IdempotencyLedger;

/// A claim can vanish between the failed insert and the read when another
/// delivery releases it; the insert is retried this many times.
const MAX_CLAIM_ATTEMPTS: u32 = 3;

/// PostgreSQL implementation of the IdempotencyLedger port.
pub struct PostgresIdempotencyLedger {
    pool: PgPool,
    claim_ttl: Duration,
}

impl PostgresIdempotencyLedger {
    /// Creates a new PostgresIdempotencyLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            claim_ttl: DEFAULT_CLAIM_TTL,
        }
    }

    /// Sets how long an unconfirmed claim blocks other deliveries.
    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    async fn try_insert(&self, record: &IdempotencyRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_callback_ledger (
                provider, external_reference, internal_order_id, last_status, state, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (provider, external_reference) DO NOTHING
            "#,
        )
        .bind(record.key.provider().as_str())
        .bind(record.key.external_reference())
        .bind(&record.internal_order_id)
        .bind(record.last_status.as_str())
        .bind(record.state.as_str())
        .bind(record.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to claim callback: {}", e))
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Replaces a stale claim, provided nobody touched it since it was read.
    async fn try_take_over(
        &self,
        stale: &IdempotencyRecord,
        record: &IdempotencyRecord,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_callback_ledger
            SET internal_order_id = $3, recorded_at = $4
            WHERE provider = $1 AND external_reference = $2
              AND state = 'in_progress' AND last_status = $5 AND recorded_at = $6
            "#,
        )
        .bind(record.key.provider().as_str())
        .bind(record.key.external_reference())
        .bind(&record.internal_order_id)
        .bind(record.recorded_at.as_datetime())
        .bind(stale.last_status.as_str())
        .bind(stale.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to take over stale claim: {}", e),
            )
        })?;

        Ok(result.rows_affected() == 1)
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    provider: String,
    external_reference: String,
    internal_order_id: String,
    last_status: String,
    state: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for IdempotencyRecord {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let provider: Provider = row.provider.parse().map_err(|e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider value: {}", e))
        })?;
        let last_status: PaymentStatus = row.last_status.parse().map_err(|e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status value: {}", e))
        })?;
        let state: ClaimState = row.state.parse().map_err(|e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid state value: {}", e))
        })?;

        Ok(IdempotencyRecord {
            key: IdempotencyKey::new(provider, row.external_reference),
            internal_order_id: row.internal_order_id,
            last_status,
            state,
            recorded_at: Timestamp::from_datetime(row.recorded_at),
        })
    }
}

#[async_trait]
impl IdempotencyLedger for PostgresIdempotencyLedger {
    async fn apply_if_new(&self, record: IdempotencyRecord) -> Result<ApplyOutcome, DomainError> {
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            if self.try_insert(&record).await? {
                return Ok(ApplyOutcome::Applied);
            }

            let existing = match self.find(&record.key).await? {
                Some(existing) => existing,
                None => continue,
            };

            let stale_before = stale_claim_cutoff(self.claim_ttl);
            match ApplyOutcome::decide(Some(&existing), &record, &stale_before) {
                ApplyOutcome::Applied => {
                    if self.try_take_over(&existing, &record).await? {
                        tracing::warn!(key = %record.key, "Took over stale callback claim");
                        return Ok(ApplyOutcome::Applied);
                    }
                }
                outcome => return Ok(outcome),
            }
        }

        Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Could not claim {} after {} attempts", record.key, MAX_CLAIM_ATTEMPTS),
        ))
    }

    async fn confirm(
        &self,
        key: &IdempotencyKey,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_callback_ledger
            SET state = 'applied', recorded_at = NOW()
            WHERE provider = $1 AND external_reference = $2
              AND last_status = $3 AND state = 'in_progress'
            "#,
        )
        .bind(key.provider().as_str())
        .bind(key.external_reference())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to confirm claim: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(
        &self,
        key: &IdempotencyKey,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM payment_callback_ledger
            WHERE provider = $1 AND external_reference = $2
              AND last_status = $3 AND state = 'in_progress'
            "#,
        )
        .bind(key.provider().as_str())
        .bind(key.external_reference())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to release claim: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, DomainError> {
        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            SELECT provider, external_reference, internal_order_id, last_status, state, recorded_at
            FROM payment_callback_ledger
            WHERE provider = $1 AND external_reference = $2
            "#,
        )
        .bind(key.provider().as_str())
        .bind(key.external_reference())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find claim: {}", e))
        })?;

        row.map(IdempotencyRecord::try_from).transpose()
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM payment_callback_ledger WHERE recorded_at < $1")
            .bind(timestamp.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to delete old claims: {}", e),
                )
            })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(provider: &str, status: &str, state: &str) -> LedgerRow {
        LedgerRow {
            provider: provider.to_string(),
            external_reference: "T123".to_string(),
            internal_order_id: "INV-1".to_string(),
            last_status: status.to_string(),
            state: state.to_string(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = IdempotencyRecord::try_from(row("tripay", "paid", "applied")).unwrap();

        assert_eq!(record.key, IdempotencyKey::new(Provider::Tripay, "T123"));
        assert_eq!(record.internal_order_id, "INV-1");
        assert_eq!(record.last_status, PaymentStatus::Paid);
        assert_eq!(record.state, ClaimState::Applied);
    }

    #[test]
    fn in_progress_row_converts() {
        let record = IdempotencyRecord::try_from(row("xendit", "failed", "in_progress")).unwrap();
        assert_eq!(record.state, ClaimState::InProgress);
    }

    #[test]
    fn row_with_unknown_provider_fails() {
        let err = IdempotencyRecord::try_from(row("midtrans", "paid", "applied")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn row_with_unknown_status_fails() {
        let err = IdempotencyRecord::try_from(row("tripay", "refunded", "applied")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn row_with_unknown_state_fails() {
        let err = IdempotencyRecord::try_from(row("tripay", "paid", "done")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
