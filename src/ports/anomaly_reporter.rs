//! AnomalyReporter port - Operator-visible error channel.
//!
//! Some callbacks are authentic but cannot be applied: a conflicting terminal
//! status, a payload whose fields do not normalize, or an order service that
//! keeps failing. Those are acknowledged to some providers anyway, so they
//! must surface somewhere an operator will see them.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::CallbackId;
use crate::domain::payment::{IdempotencyKey, Provider};

/// Category of anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// A different terminal status was already recorded for the reference.
    IdempotencyConflict,
    /// A verified payload could not be normalized.
    NormalizationFailure,
    /// The order collaborator failed after all attempts.
    DownstreamFailure,
    /// The ledger could not be read or written.
    StorageFailure,
    /// A delivery arrived while another copy of it was still being applied.
    ConcurrentDelivery,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::IdempotencyConflict => "idempotency_conflict",
            AnomalyKind::NormalizationFailure => "normalization_failure",
            AnomalyKind::DownstreamFailure => "downstream_failure",
            AnomalyKind::StorageFailure => "storage_failure",
            AnomalyKind::ConcurrentDelivery => "concurrent_delivery",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reportable anomaly. `detail` never carries secrets.
#[derive(Debug, Clone)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub provider: Provider,
    pub callback_id: CallbackId,
    pub key: Option<IdempotencyKey>,
    pub detail: String,
}

/// Port for surfacing anomalies to operators.
///
/// Reporting is best-effort and infallible from the caller's point of view;
/// a reporter that cannot deliver should log locally.
#[async_trait]
pub trait AnomalyReporter: Send + Sync {
    async fn report(&self, anomaly: Anomaly);
}
