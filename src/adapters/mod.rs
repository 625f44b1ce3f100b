//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `anomaly` - Anomaly reporting through `tracing`
//! - `http` - Axum endpoints for provider callbacks
//! - `memory` - In-memory ledger, order book and anomaly recorder
//! - `postgres` - PostgreSQL idempotency ledger

pub mod anomaly;
pub mod http;
pub mod memory;
pub mod postgres;

pub use anomaly::TracingAnomalyReporter;
pub use http::{callback_router, CallbackAppState};
pub use memory::{InMemoryIdempotencyLedger, InMemoryOrderBook, RecordingAnomalyReporter};
pub use postgres::PostgresIdempotencyLedger;
