//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod callback;

pub use callback::{DispatchPolicy, DownstreamAction, OrderDispatcher, ProcessCallbackHandler};
