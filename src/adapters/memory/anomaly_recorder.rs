//! Anomaly reporter that keeps everything it is given.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{Anomaly, AnomalyKind, AnomalyReporter};

/// Collects reported anomalies for later inspection.
#[derive(Default)]
pub struct RecordingAnomalyReporter {
    anomalies: Mutex<Vec<Anomaly>>,
}

impl RecordingAnomalyReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn anomalies(&self) -> Vec<Anomaly> {
        self.anomalies.lock().await.clone()
    }

    pub async fn count_of(&self, kind: AnomalyKind) -> usize {
        self.anomalies
            .lock()
            .await
            .iter()
            .filter(|a| a.kind == kind)
            .count()
    }
}

#[async_trait]
impl AnomalyReporter for RecordingAnomalyReporter {
    async fn report(&self, anomaly: Anomaly) {
        self.anomalies.lock().await.push(anomaly);
    }
}
