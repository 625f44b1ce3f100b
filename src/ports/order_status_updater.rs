//! OrderStatusUpdater port - Applies a payment outcome to an order.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::PaymentStatus;

/// Downstream collaborator that owns order records.
///
/// `set_status` must be idempotent: setting the status an order already has
/// succeeds without side effects. The dispatcher may call it more than once
/// for the same event when an attempt times out.
#[async_trait]
pub trait OrderStatusUpdater: Send + Sync {
    async fn set_status(&self, order_id: &str, status: PaymentStatus) -> Result<(), DomainError>;
}
