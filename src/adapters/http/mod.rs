//! HTTP adapters - REST API implementations.

pub mod callbacks;

pub use callbacks::{callback_router, CallbackAppState};
