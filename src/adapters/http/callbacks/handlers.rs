//! HTTP handlers for provider callbacks.
//!
//! Each callback handler captures the request verbatim, runs it through
//! [`ProcessCallbackHandler`] and renders the provider's response contract.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::application::handlers::callback::ProcessCallbackHandler;
use crate::domain::payment::{CallbackReply, Provider, RawCallback};

use super::dto::{DuitkuHealthResponse, DuitkuReturnQuery, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the callback endpoints.
#[derive(Clone)]
pub struct CallbackAppState {
    pub processor: Arc<ProcessCallbackHandler>,
    /// Shown masked on the Duitku health endpoint.
    pub duitku_merchant_code: Option<String>,
}

impl CallbackAppState {
    pub fn new(processor: Arc<ProcessCallbackHandler>, duitku_merchant_code: Option<String>) -> Self {
        Self {
            processor,
            duitku_merchant_code,
        }
    }
}

impl IntoResponse for CallbackReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Callback Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /callback/duitku - Duitku payment callback (form-encoded)
pub async fn duitku_callback(
    State(state): State<CallbackAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> CallbackReply {
    process(&state, Provider::Duitku, connect_info, headers, body).await
}

/// POST /callback - Tripay payment callback (JSON)
pub async fn tripay_callback(
    State(state): State<CallbackAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> CallbackReply {
    process(&state, Provider::Tripay, connect_info, headers, body).await
}

/// POST /webhook/xendit - Xendit payment request webhook (JSON)
pub async fn xendit_webhook(
    State(state): State<CallbackAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> CallbackReply {
    process(&state, Provider::Xendit, connect_info, headers, body).await
}

async fn process(
    state: &CallbackAppState,
    provider: Provider,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> CallbackReply {
    let remote_ip = connect_info.map(|ConnectInfo(addr)| addr.ip());
    let raw = RawCallback::new(provider, body.to_vec(), headers, remote_ip);
    let callback_id = raw.id();

    let result = state.processor.handle(raw).await;
    let reply = CallbackReply::for_result(provider, &result);

    match &result {
        Ok(outcome) => tracing::info!(
            %provider,
            %callback_id,
            outcome = ?outcome,
            status = reply.status.as_u16(),
            "Callback acknowledged"
        ),
        Err(err) if err.is_boundary_rejection() => tracing::warn!(
            %provider,
            %callback_id,
            code = err.code(),
            status = reply.status.as_u16(),
            "Callback rejected"
        ),
        Err(err) => tracing::error!(
            %provider,
            %callback_id,
            code = err.code(),
            retryable = err.is_retryable(),
            status = reply.status.as_u16(),
            "Callback not applied"
        ),
    }

    reply
}

// ════════════════════════════════════════════════════════════════════════════════
// Informational Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Callback server is running",
    })
}

/// GET /callback/duitku - Duitku endpoint liveness check
pub async fn duitku_health(State(state): State<CallbackAppState>) -> Json<DuitkuHealthResponse> {
    Json(DuitkuHealthResponse::new(state.duitku_merchant_code.as_deref()))
}

/// GET /return/duitku - Browser return page after Duitku checkout
///
/// Informational only; the callback is the authoritative source of status.
pub async fn duitku_return(Query(query): Query<DuitkuReturnQuery>) -> Html<String> {
    tracing::info!(
        order_id = %query.merchant_order_id,
        reference = %query.reference,
        result_code = %query.result_code,
        "Duitku return page visited"
    );
    Html(render_return_page(&query))
}

fn render_return_page(query: &DuitkuReturnQuery) -> String {
    let (title, note) = if query.result_code == "00" {
        ("Payment successful", "Your payment has been received.")
    } else {
        (
            "Payment being processed",
            "Your order will be updated once the payment is confirmed.",
        )
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n<p>{note}</p>\n\
         <p>Order ID: {order_id}</p>\n<p>Reference: {reference}</p>\n</body>\n</html>\n",
        title = title,
        note = note,
        order_id = escape_html(&query.merchant_order_id),
        reference = escape_html(&query.reference),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(result_code: &str, order_id: &str) -> DuitkuReturnQuery {
        DuitkuReturnQuery {
            merchant_order_id: order_id.to_string(),
            reference: "DK1".to_string(),
            result_code: result_code.to_string(),
        }
    }

    #[test]
    fn return_page_reports_success() {
        let html = render_return_page(&query("00", "ORDER-1"));
        assert!(html.contains("Payment successful"));
        assert!(html.contains("ORDER-1"));
    }

    #[test]
    fn return_page_reports_processing_otherwise() {
        let html = render_return_page(&query("01", "ORDER-1"));
        assert!(html.contains("Payment being processed"));
    }

    #[test]
    fn return_page_escapes_query_values() {
        let html = render_return_page(&query("00", "<script>alert(1)</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn escape_html_handles_quotes() {
        assert_eq!(escape_html(r#"a"b'c&"#), "a&quot;b&#x27;c&amp;");
    }
}
