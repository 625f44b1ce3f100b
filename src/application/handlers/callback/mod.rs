//! Callback command handlers.

mod dispatch;
mod process_callback;

pub use dispatch::{DispatchPolicy, DownstreamAction, OrderDispatcher};
pub use process_callback::ProcessCallbackHandler;
