//! ProcessCallbackHandler - Runs one provider callback through the pipeline.
//!
//! ```text
//! source check -> verify -> decode -> normalize -> ledger claim -> dispatch
//! ```
//!
//! Every stage before the ledger is pure and fails closed. The ledger claim
//! happens before dispatch so concurrent duplicates cannot both reach the
//! order service. The claim is confirmed once the order update succeeded and
//! released if it failed, so the provider's retry can apply it. A duplicate
//! that arrives while the claim is unconfirmed gets a retryable error rather
//! than an acknowledgement.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::CallbackId;
use crate::domain::payment::{
    normalize, ApplyOutcome, CallbackError, CallbackOutcome, CallbackVerifier, IdempotencyRecord,
    NormalizedEvent, PaymentStatus, Provider, ProviderPayload, RawCallback, SourceAllowlist,
};
use crate::ports::{Anomaly, AnomalyKind, AnomalyReporter, IdempotencyLedger};

use super::dispatch::OrderDispatcher;

/// Handler for inbound provider callbacks.
pub struct ProcessCallbackHandler {
    verifier: Arc<CallbackVerifier>,
    ledger: Arc<dyn IdempotencyLedger>,
    dispatcher: Arc<OrderDispatcher>,
    reporter: Arc<dyn AnomalyReporter>,
    allowlists: HashMap<Provider, SourceAllowlist>,
}

impl ProcessCallbackHandler {
    pub fn new(
        verifier: Arc<CallbackVerifier>,
        ledger: Arc<dyn IdempotencyLedger>,
        dispatcher: Arc<OrderDispatcher>,
        reporter: Arc<dyn AnomalyReporter>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            dispatcher,
            reporter,
            allowlists: HashMap::new(),
        }
    }

    /// Restricts a provider's callbacks to the given source addresses.
    pub fn with_source_allowlist(mut self, provider: Provider, allowlist: SourceAllowlist) -> Self {
        self.allowlists.insert(provider, allowlist);
        self
    }

    pub async fn handle(&self, raw: RawCallback) -> Result<CallbackOutcome, CallbackError> {
        let provider = raw.provider();
        let callback_id = raw.id();

        // 1. Source address
        if let Some(allowlist) = self.allowlists.get(&provider) {
            if !allowlist.admits(raw.remote_ip(), raw.headers()) {
                tracing::warn!(
                    %provider,
                    %callback_id,
                    remote_ip = ?raw.remote_ip(),
                    "Callback from address outside allow-list rejected"
                );
                return Err(CallbackError::SourceNotAllowed);
            }
        }

        // 2. Signature
        let verified = self.verifier.verify(raw).map_err(|err| {
            tracing::warn!(%provider, %callback_id, error = %err, "Callback failed verification");
            CallbackError::from(err)
        })?;
        tracing::debug!(%provider, %callback_id, "Callback signature verified");

        // 3. Decode
        let payload = ProviderPayload::decode(&verified).map_err(|err| {
            tracing::warn!(%provider, %callback_id, error = %err, "Callback payload rejected");
            err
        })?;

        // 4. Normalize
        let event = match normalize(&payload, verified.raw().received_at()) {
            Ok(event) => event,
            Err(err) => {
                self.reporter
                    .report(Anomaly {
                        kind: AnomalyKind::NormalizationFailure,
                        provider,
                        callback_id,
                        key: None,
                        detail: err.to_string(),
                    })
                    .await;
                return Err(err.into());
            }
        };
        tracing::debug!(
            %provider,
            %callback_id,
            order_id = event.internal_order_id(),
            reference = event.external_reference(),
            status = %event.status(),
            amount = event.amount(),
            "Callback normalized"
        );

        // 5. Ledger and dispatch
        self.apply(&event, callback_id).await
    }

    async fn apply(
        &self,
        event: &NormalizedEvent,
        callback_id: CallbackId,
    ) -> Result<CallbackOutcome, CallbackError> {
        let provider = event.provider();

        let record = match IdempotencyRecord::from_event(event) {
            Some(record) => record,
            None => {
                if event.status() == PaymentStatus::Unknown {
                    tracing::warn!(
                        %provider,
                        %callback_id,
                        raw_status = event.raw_status_code(),
                        "Unrecognized callback status ignored"
                    );
                } else {
                    tracing::info!(
                        %provider,
                        %callback_id,
                        order_id = event.internal_order_id(),
                        status = %event.status(),
                        "Non-terminal callback acknowledged"
                    );
                }
                self.dispatcher.dispatch(event).await?;
                return Ok(CallbackOutcome::Ignored);
            }
        };
        let key = record.key.clone();

        let outcome = match self.ledger.apply_if_new(record).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(AnomalyKind::StorageFailure, event, callback_id, err.to_string())
                    .await;
                return Err(CallbackError::Storage(err.to_string()));
            }
        };

        match outcome {
            ApplyOutcome::Applied => {
                if let Err(err) = self.dispatcher.dispatch(event).await {
                    self.report(AnomalyKind::DownstreamFailure, event, callback_id, err.to_string())
                        .await;
                    self.release_claim(event, callback_id).await;
                    return Err(err);
                }
                self.confirm_claim(event, callback_id).await;
                tracing::info!(
                    %provider,
                    %callback_id,
                    key = %key,
                    order_id = event.internal_order_id(),
                    status = %event.status(),
                    "Callback applied"
                );
                Ok(CallbackOutcome::Applied)
            }
            ApplyOutcome::AlreadyApplied => {
                tracing::info!(%provider, %callback_id, key = %key, "Duplicate callback acknowledged");
                Ok(CallbackOutcome::Duplicate)
            }
            ApplyOutcome::InProgress => {
                let err = CallbackError::ClaimInProgress { key };
                self.report(AnomalyKind::ConcurrentDelivery, event, callback_id, err.to_string())
                    .await;
                Err(err)
            }
            ApplyOutcome::Conflict { recorded } => {
                let err = CallbackError::IdempotencyConflict {
                    key,
                    recorded,
                    received: event.status(),
                };
                self.report(AnomalyKind::IdempotencyConflict, event, callback_id, err.to_string())
                    .await;
                Err(err)
            }
        }
    }

    /// The order is already updated at this point, so a failed confirm is
    /// reported but does not fail the callback. The claim then stays
    /// unconfirmed until it goes stale and a redelivery re-applies it.
    async fn confirm_claim(&self, event: &NormalizedEvent, callback_id: CallbackId) {
        let key = event.idempotency_key();
        match self.ledger.confirm(&key, event.status()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                provider = %event.provider(),
                %callback_id,
                key = %key,
                "Idempotency claim was gone before it could be confirmed"
            ),
            Err(err) => {
                tracing::error!(
                    provider = %event.provider(),
                    %callback_id,
                    key = %key,
                    error = %err,
                    "Failed to confirm idempotency claim"
                );
                self.report(AnomalyKind::StorageFailure, event, callback_id, err.to_string())
                    .await;
            }
        }
    }

    async fn release_claim(
        &self,
        event: &NormalizedEvent,
        callback_id: CallbackId,
    ) {
        let key = event.idempotency_key();
        if let Err(err) = self.ledger.release(&key, event.status()).await {
            tracing::error!(
                provider = %event.provider(),
                %callback_id,
                key = %key,
                error = %err,
                "Failed to release idempotency claim"
            );
            self.report(AnomalyKind::StorageFailure, event, callback_id, err.to_string())
                .await;
        }
    }

    async fn report(
        &self,
        kind: AnomalyKind,
        event: &NormalizedEvent,
        callback_id: CallbackId,
        detail: String,
    ) {
        self.reporter
            .report(Anomaly {
                kind,
                provider: event.provider(),
                callback_id,
                key: Some(event.idempotency_key()),
                detail,
            })
            .await;
    }
}
