//! Anomaly reporting adapters.

mod tracing_reporter;

pub use tracing_reporter::{TracingAnomalyReporter, ANOMALY_TARGET};
