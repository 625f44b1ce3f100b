//! Payment callback domain.
//!
//! Authenticates provider callbacks, normalizes them into a provider-agnostic
//! event and decides how each delivery interacts with the idempotency ledger.
//!
//! # Module Structure
//!
//! - `provider` - Supported payment providers and their signature schemes
//! - `raw_callback` - Verbatim capture of an inbound request
//! - `signature` - Per-provider signature verification
//! - `payload` - Typed provider payloads
//! - `normalizer` - Payload to `NormalizedEvent` mapping
//! - `status` - PaymentStatus state machine
//! - `idempotency` - Ledger keys, records and apply decision
//! - `source` - Source IP allow-list
//! - `response` - Per-provider HTTP response contract

mod errors;
mod event;
mod idempotency;
mod normalizer;
mod payload;
mod provider;
mod raw_callback;
mod response;
mod signature;
mod source;
mod status;

pub use errors::{CallbackError, NormalizationError};
pub use event::NormalizedEvent;
pub use idempotency::{
    stale_claim_cutoff, ApplyOutcome, ClaimState, IdempotencyKey, IdempotencyRecord,
    DEFAULT_CLAIM_TTL,
};
pub use normalizer::normalize;
pub use payload::{
    DuitkuPayload, ProviderPayload, TripayPayload, XenditPaymentData, XenditPayload,
    TRIPAY_EVENT_HEADER,
};
pub use provider::Provider;
pub use raw_callback::RawCallback;
pub use response::{CallbackOutcome, CallbackReply};
pub use signature::{
    duitku_signature, hmac_sha256_hex, verify_duitku_signature, verify_hmac_sha256,
    CallbackVerifier, MissingTokenPolicy, SignatureError, SignatureScheme, VerificationKeys,
    VerifiedCallback,
};
pub use source::{SourceAllowlist, DUITKU_PRODUCTION_IPS, DUITKU_SANDBOX_IPS};
pub use status::PaymentStatus;
