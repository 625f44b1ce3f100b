//! Error taxonomy for the callback pipeline.
//!
//! Boundary errors (source, signature, malformed body) reject a request before
//! it can touch order state. Everything after the signature check concerns an
//! authentic callback, and the per-provider response contract decides whether
//! the provider should retry it.

use thiserror::Error;

use super::idempotency::IdempotencyKey;
use super::signature::SignatureError;
use super::status::PaymentStatus;

/// A recognized payload whose fields could not be mapped to a normalized event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// A field required for the canonical event was absent or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// An amount field was not a non-negative integer.
    #[error("Field '{field}' is not a non-negative integer amount: {value}")]
    InvalidAmount { field: &'static str, value: String },
}

/// Errors that occur while processing a callback.
#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    /// The request did not originate from an allow-listed address.
    #[error("Source address not allowed")]
    SourceNotAllowed,

    /// A signature was required but not supplied.
    #[error("Signature missing")]
    SignatureMissing,

    /// The supplied signature did not match.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// The body does not parse in the provider's declared format.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload parsed but a field could not be normalized.
    #[error("Normalization failed: {0}")]
    Normalization(#[from] NormalizationError),

    /// A different terminal status is already recorded for this reference.
    #[error("Idempotency conflict for {key}: recorded {recorded}, received {received}")]
    IdempotencyConflict {
        key: IdempotencyKey,
        recorded: PaymentStatus,
        received: PaymentStatus,
    },

    /// Another delivery of the same status is still being applied.
    #[error("Callback for {key} is already being processed")]
    ClaimInProgress { key: IdempotencyKey },

    /// The order-update collaborator failed after all attempts.
    #[error("Downstream failure: {0}")]
    DownstreamFailure(String),

    /// The idempotency ledger could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CallbackError {
    /// Returns true for errors raised before the callback was authenticated
    /// and parsed. These never reach the dispatcher.
    pub fn is_boundary_rejection(&self) -> bool {
        matches!(
            self,
            CallbackError::SourceNotAllowed
                | CallbackError::SignatureMissing
                | CallbackError::SignatureInvalid
                | CallbackError::MalformedPayload(_)
        )
    }

    /// Returns true if a later delivery of the same callback could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallbackError::ClaimInProgress { .. }
                | CallbackError::DownstreamFailure(_)
                | CallbackError::Storage(_)
        )
    }

    /// Stable machine-readable code for logs and response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CallbackError::SourceNotAllowed => "SOURCE_NOT_ALLOWED",
            CallbackError::SignatureMissing => "SIGNATURE_MISSING",
            CallbackError::SignatureInvalid => "SIGNATURE_INVALID",
            CallbackError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            CallbackError::Normalization(_) => "NORMALIZATION_ERROR",
            CallbackError::IdempotencyConflict { .. } => "IDEMPOTENCY_CONFLICT",
            CallbackError::ClaimInProgress { .. } => "CLAIM_IN_PROGRESS",
            CallbackError::DownstreamFailure(_) => "DOWNSTREAM_FAILURE",
            CallbackError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<SignatureError> for CallbackError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Missing => CallbackError::SignatureMissing,
            SignatureError::Invalid => CallbackError::SignatureInvalid,
            SignatureError::Unreadable => {
                CallbackError::MalformedPayload("form body could not be decoded".to_string())
            }
        }
    }
}
