//! In-memory adapters.
//!
//! - `InMemoryIdempotencyLedger` - Process-local ledger for single-instance deployments and tests
//! - `InMemoryOrderBook` - Order collaborator enforcing the payment state machine
//! - `RecordingAnomalyReporter` - Captures anomalies for assertions

mod anomaly_recorder;
mod idempotency_ledger;
mod order_book;

pub use anomaly_recorder::RecordingAnomalyReporter;
pub use idempotency_ledger::InMemoryIdempotencyLedger;
pub use order_book::InMemoryOrderBook;
