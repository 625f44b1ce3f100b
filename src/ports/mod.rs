//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Callback Ports
//!
//! - `IdempotencyLedger` - Atomic at-most-once record of applied terminal statuses
//! - `OrderStatusUpdater` - Downstream order-state collaborator
//! - `AnomalyReporter` - Operator-visible channel for conflicts and failures

mod anomaly_reporter;
mod idempotency_ledger;
mod order_status_updater;

pub use anomaly_reporter::{Anomaly, AnomalyKind, AnomalyReporter};
pub use idempotency_ledger::IdempotencyLedger;
pub use order_status_updater::OrderStatusUpdater;
