//! In-memory order collaborator.
//!
//! Stands in for the external order service. Orders it has never seen start
//! out `Pending`.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::PaymentStatus;
use crate::ports::OrderStatusUpdater;

/// Order statuses keyed by internal order id.
#[derive(Default)]
pub struct InMemoryOrderBook {
    orders: RwLock<HashMap<String, PaymentStatus>>,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of an order, if it has one.
    pub async fn status_of(&self, order_id: &str) -> Option<PaymentStatus> {
        self.orders.read().await.get(order_id).copied()
    }
}

#[async_trait]
impl OrderStatusUpdater for InMemoryOrderBook {
    async fn set_status(&self, order_id: &str, status: PaymentStatus) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(order_id)
            .copied()
            .unwrap_or(PaymentStatus::Pending);

        if current == status {
            return Ok(());
        }

        if !current.can_transition_to(&status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Order {} cannot move from {} to {}", order_id, current, status),
            )
            .with_detail("order_id", order_id));
        }

        orders.insert(order_id.to_string(), status);
        tracing::debug!(order_id, from = %current, to = %status, "Order status updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_order_moves_to_terminal_status() {
        let book = InMemoryOrderBook::new();

        book.set_status("ORDER-1", PaymentStatus::Paid).await.unwrap();

        assert_eq!(book.status_of("ORDER-1").await, Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn setting_same_status_is_idempotent() {
        let book = InMemoryOrderBook::new();
        book.set_status("ORDER-1", PaymentStatus::Paid).await.unwrap();

        assert!(book.set_status("ORDER-1", PaymentStatus::Paid).await.is_ok());
    }

    #[tokio::test]
    async fn terminal_order_rejects_other_status() {
        let book = InMemoryOrderBook::new();
        book.set_status("ORDER-1", PaymentStatus::Paid).await.unwrap();

        let err = book
            .set_status("ORDER-1", PaymentStatus::Failed)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(book.status_of("ORDER-1").await, Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn pending_can_be_recorded() {
        let book = InMemoryOrderBook::new();

        book.set_status("ORDER-1", PaymentStatus::Pending).await.unwrap();
        book.set_status("ORDER-1", PaymentStatus::Expired).await.unwrap();

        assert_eq!(book.status_of("ORDER-1").await, Some(PaymentStatus::Expired));
    }
}
