//! Axum router configuration for the callback endpoints.
//!
//! Paths are fixed by what each provider has been configured to call.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    duitku_callback, duitku_health, duitku_return, health, tripay_callback, xendit_webhook,
    CallbackAppState,
};

/// Create the callback router.
///
/// # Routes
///
/// ## Provider Callbacks (signature verified)
/// - `POST /callback/duitku` - Duitku payment callback
/// - `POST /callback` - Tripay payment callback
/// - `POST /webhook/xendit` - Xendit payment request webhook
///
/// ## Informational (never mutate state)
/// - `GET /callback/duitku` - Duitku endpoint liveness
/// - `GET /return/duitku` - Browser return page
/// - `GET /health` - Service liveness
pub fn callback_router() -> Router<CallbackAppState> {
    Router::new()
        .route("/callback/duitku", post(duitku_callback).get(duitku_health))
        .route("/return/duitku", get(duitku_return))
        .route("/callback", post(tripay_callback))
        .route("/webhook/xendit", post(xendit_webhook))
        .route("/health", get(health))
}
