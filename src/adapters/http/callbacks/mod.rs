//! HTTP adapter for payment provider callbacks.
//!
//! - `POST /callback/duitku` - Duitku callback
//! - `GET /callback/duitku` - Duitku endpoint liveness
//! - `GET /return/duitku` - Duitku browser return page
//! - `POST /callback` - Tripay callback
//! - `POST /webhook/xendit` - Xendit webhook
//! - `GET /health` - Service liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::CallbackAppState;
pub use routes::callback_router;
