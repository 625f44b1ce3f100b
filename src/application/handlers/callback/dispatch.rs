//! Downstream dispatch of normalized events.
//!
//! Maps a canonical status to an order action and runs it through the
//! injected [`OrderStatusUpdater`] with a per-attempt timeout and bounded
//! retries.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{CallbackError, NormalizedEvent, PaymentStatus};
use crate::ports::OrderStatusUpdater;

/// What an event does to its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownstreamAction {
    MarkPaid,
    MarkFailed,
    MarkExpired,
    /// Pending and unrecognized events change nothing.
    Ignore,
}

impl DownstreamAction {
    pub fn for_status(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Paid => DownstreamAction::MarkPaid,
            PaymentStatus::Failed => DownstreamAction::MarkFailed,
            PaymentStatus::Expired => DownstreamAction::MarkExpired,
            PaymentStatus::Pending | PaymentStatus::Unknown => DownstreamAction::Ignore,
        }
    }

    /// Status the order is moved to, if any.
    pub fn target_status(&self) -> Option<PaymentStatus> {
        match self {
            DownstreamAction::MarkPaid => Some(PaymentStatus::Paid),
            DownstreamAction::MarkFailed => Some(PaymentStatus::Failed),
            DownstreamAction::MarkExpired => Some(PaymentStatus::Expired),
            DownstreamAction::Ignore => None,
        }
    }
}

/// Timeout and retry bounds for downstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Limit for a single `set_status` call.
    pub timeout: Duration,
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl DispatchPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        // attempt is 1-based; the shift is capped and the product saturates
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
    }
}

/// Runs downstream actions for normalized events.
pub struct OrderDispatcher {
    updater: Arc<dyn OrderStatusUpdater>,
    policy: DispatchPolicy,
}

impl OrderDispatcher {
    pub fn new(updater: Arc<dyn OrderStatusUpdater>, policy: DispatchPolicy) -> Self {
        Self { updater, policy }
    }

    /// Applies the event's action to its order.
    ///
    /// # Errors
    ///
    /// `DownstreamFailure` once every attempt timed out or failed, or
    /// immediately when the order refuses the transition.
    pub async fn dispatch(&self, event: &NormalizedEvent) -> Result<DownstreamAction, CallbackError> {
        let action = DownstreamAction::for_status(event.status());
        let status = match action.target_status() {
            Some(status) => status,
            None => return Ok(action),
        };

        let order_id = event.internal_order_id();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::from("No attempts made");

        for attempt in 1..=max_attempts {
            match timeout(self.policy.timeout, self.updater.set_status(order_id, status)).await {
                Ok(Ok(())) => {
                    tracing::debug!(order_id, %status, attempt, "Order status dispatched");
                    return Ok(action);
                }
                Ok(Err(err)) if !is_retryable(&err) => {
                    return Err(CallbackError::DownstreamFailure(err.to_string()));
                }
                Ok(Err(err)) => {
                    tracing::warn!(order_id, %status, attempt, error = %err, "Order update failed");
                    last_error = err.to_string();
                }
                Err(_) => {
                    tracing::warn!(order_id, %status, attempt, "Order update timed out");
                    last_error = format!("Order update timed out after {:?}", self.policy.timeout);
                }
            }

            if attempt < max_attempts {
                sleep(self.policy.backoff_for(attempt)).await;
            }
        }

        Err(CallbackError::DownstreamFailure(last_error))
    }
}

fn is_retryable(err: &DomainError) -> bool {
    !matches!(
        err.code,
        ErrorCode::InvalidStateTransition | ErrorCode::ValidationFailed | ErrorCode::NotFound
    )
}
