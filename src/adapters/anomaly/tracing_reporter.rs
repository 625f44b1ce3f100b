//! Reports anomalies as structured `error` events.
//!
//! All events go to the `payment_anomaly` target so log pipelines can route
//! them to an alerting channel with a single filter.

use async_trait::async_trait;

use crate::ports::{Anomaly, AnomalyReporter};

/// Log target for anomaly events.
pub const ANOMALY_TARGET: &str = "payment_anomaly";

/// AnomalyReporter backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnomalyReporter;

impl TracingAnomalyReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnomalyReporter for TracingAnomalyReporter {
    async fn report(&self, anomaly: Anomaly) {
        let key = anomaly
            .key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        tracing::error!(
            target: ANOMALY_TARGET,
            kind = %anomaly.kind,
            provider = %anomaly.provider,
            callback_id = %anomaly.callback_id,
            key = %key,
            detail = %anomaly.detail,
            "Payment callback anomaly"
        );
    }
}
