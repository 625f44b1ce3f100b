//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresIdempotencyLedger` - Shared idempotency ledger for multi-instance deployments

mod idempotency_ledger;

pub use idempotency_ledger::PostgresIdempotencyLedger;
