//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and the error type used across
//! ports and adapters.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::CallbackId;
pub use timestamp::Timestamp;
