//! Domain layer containing the callback rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `payment` - Callback verification, normalization and idempotency rules

pub mod foundation;
pub mod payment;
