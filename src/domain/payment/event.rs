//! Provider-agnostic payment event.

use crate::domain::foundation::Timestamp;

use super::errors::NormalizationError;
use super::idempotency::IdempotencyKey;
use super::provider::Provider;
use super::status::PaymentStatus;

/// A verified callback mapped onto the canonical event shape.
///
/// Invariant: `internal_order_id` is non-empty unless the status is
/// `Unknown`. Amounts are whole minor units and cannot be negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    provider: Provider,
    external_reference: String,
    internal_order_id: String,
    status: PaymentStatus,
    amount: u64,
    raw_status_code: String,
    received_at: Timestamp,
}

impl NormalizedEvent {
    /// Builds an event, enforcing the order-id invariant.
    ///
    /// # Errors
    ///
    /// `MissingField` when a non-`Unknown` event has no order id or no
    /// external reference.
    pub fn new(
        provider: Provider,
        external_reference: impl Into<String>,
        internal_order_id: impl Into<String>,
        status: PaymentStatus,
        amount: u64,
        raw_status_code: impl Into<String>,
        received_at: Timestamp,
    ) -> Result<Self, NormalizationError> {
        let external_reference = external_reference.into();
        let internal_order_id = internal_order_id.into();

        if status != PaymentStatus::Unknown {
            if internal_order_id.is_empty() {
                return Err(NormalizationError::MissingField("internal_order_id"));
            }
            if external_reference.is_empty() {
                return Err(NormalizationError::MissingField("external_reference"));
            }
        }

        Ok(Self {
            provider,
            external_reference,
            internal_order_id,
            status,
            amount,
            raw_status_code: raw_status_code.into(),
            received_at,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn external_reference(&self) -> &str {
        &self.external_reference
    }

    pub fn internal_order_id(&self) -> &str {
        &self.internal_order_id
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The provider's own status signal (result code, status or event name).
    pub fn raw_status_code(&self) -> &str {
        &self.raw_status_code
    }

    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    /// Ledger key for this event.
    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::new(self.provider, self.external_reference.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(order_id: &str, reference: &str, status: PaymentStatus) -> Result<NormalizedEvent, NormalizationError> {
        NormalizedEvent::new(
            Provider::Xendit,
            reference,
            order_id,
            status,
            0,
            "payment_request.failed",
            Timestamp::now(),
        )
    }

    #[test]
    fn builds_event_with_all_fields() {
        let e = event("ref1", "ref1", PaymentStatus::Failed).unwrap();
        assert_eq!(e.provider(), Provider::Xendit);
        assert_eq!(e.internal_order_id(), "ref1");
        assert_eq!(e.status(), PaymentStatus::Failed);
        assert_eq!(e.raw_status_code(), "payment_request.failed");
        assert_eq!(e.idempotency_key(), IdempotencyKey::new(Provider::Xendit, "ref1"));
    }

    #[test]
    fn rejects_empty_order_id_for_known_status() {
        assert_eq!(
            event("", "ref1", PaymentStatus::Paid),
            Err(NormalizationError::MissingField("internal_order_id"))
        );
    }

    #[test]
    fn rejects_empty_reference_for_known_status() {
        assert_eq!(
            event("ORDER-1", "", PaymentStatus::Pending),
            Err(NormalizationError::MissingField("external_reference"))
        );
    }

    #[test]
    fn unknown_status_allows_empty_ids() {
        assert!(event("", "", PaymentStatus::Unknown).is_ok());
    }
}
