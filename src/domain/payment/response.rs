//! Per-provider HTTP response contract.
//!
//! Providers hard-code their retry behavior on these codes, so the mapping is
//! fixed per provider:
//!
//! | Result                        | Duitku | Tripay | Xendit |
//! |-------------------------------|--------|--------|--------|
//! | SourceNotAllowed              | 403    | 403    | 403    |
//! | SignatureMissing              | 401    | 400    | 401    |
//! | SignatureInvalid              | 401    | 403    | 401    |
//! | MalformedPayload              | 400    | 400    | 400    |
//! | Normalization / Conflict      | 200    | 500    | 200    |
//! | ClaimInProgress               | 200    | 500    | 200    |
//! | DownstreamFailure / Storage   | 200    | 500    | 200    |
//! | Applied / Duplicate / Ignored | 200    | 200    | 200    |
//!
//! Duitku and Xendit get an error body with a 200 once the callback was
//! authentic, since their retry storms cost more than a dropped event.
//! Tripay retries on 5xx and gets one.

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::errors::CallbackError;
use super::provider::Provider;

/// What happened to an authentic callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A terminal status was applied for the first time.
    Applied,
    /// The same terminal status had already been applied.
    Duplicate,
    /// Pending or unrecognized; acknowledged without side effects.
    Ignored,
}

/// Status code and JSON body returned to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackReply {
    pub status: StatusCode,
    pub body: Value,
}

impl CallbackReply {
    /// Builds the reply for a processing result.
    pub fn for_result(provider: Provider, result: &Result<CallbackOutcome, CallbackError>) -> Self {
        match result {
            Ok(_) => Self::success(provider),
            Err(err) => Self::for_error(provider, err),
        }
    }

    pub fn success(provider: Provider) -> Self {
        let body = match provider {
            Provider::Tripay => json!({ "success": true }),
            Provider::Duitku | Provider::Xendit => json!({ "status": "ok" }),
        };
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn for_error(provider: Provider, err: &CallbackError) -> Self {
        Self {
            status: status_for(provider, err),
            body: error_body(provider, &public_message(err)),
        }
    }
}

fn status_for(provider: Provider, err: &CallbackError) -> StatusCode {
    match (provider, err) {
        (_, CallbackError::SourceNotAllowed) => StatusCode::FORBIDDEN,
        (Provider::Tripay, CallbackError::SignatureMissing) => StatusCode::BAD_REQUEST,
        (Provider::Tripay, CallbackError::SignatureInvalid) => StatusCode::FORBIDDEN,
        (_, CallbackError::SignatureMissing | CallbackError::SignatureInvalid) => {
            StatusCode::UNAUTHORIZED
        }
        (_, CallbackError::MalformedPayload(_)) => StatusCode::BAD_REQUEST,
        (Provider::Tripay, _) => StatusCode::INTERNAL_SERVER_ERROR,
        (Provider::Duitku | Provider::Xendit, _) => StatusCode::OK,
    }
}

fn error_body(provider: Provider, message: &str) -> Value {
    match provider {
        Provider::Tripay => json!({ "success": false, "message": message }),
        Provider::Duitku | Provider::Xendit => json!({ "status": "error", "message": message }),
    }
}

/// Message safe to show a provider. Storage and downstream details stay in
/// the logs.
fn public_message(err: &CallbackError) -> String {
    match err {
        CallbackError::SourceNotAllowed
        | CallbackError::SignatureMissing
        | CallbackError::SignatureInvalid
        | CallbackError::Normalization(_) => err.to_string(),
        CallbackError::MalformedPayload(_) => "Malformed payload".to_string(),
        CallbackError::IdempotencyConflict { .. } => "Conflicting status for reference".to_string(),
        CallbackError::ClaimInProgress { .. } => "Callback is already being processed".to_string(),
        CallbackError::DownstreamFailure(_) | CallbackError::Storage(_) => {
            "Callback could not be applied".to_string()
        }
    }
}
