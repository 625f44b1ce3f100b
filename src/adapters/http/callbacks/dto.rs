//! HTTP DTOs for the callback endpoints.
//!
//! Callback bodies themselves are provider-defined and decoded in the domain;
//! these types cover the informational endpoints.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Query string Duitku appends to the browser return URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DuitkuReturnQuery {
    pub merchant_order_id: String,
    pub reference: String,
    pub result_code: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Liveness response for the Duitku endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DuitkuHealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// First characters of the merchant code, or "Not set".
    pub merchant_code: String,
}

impl DuitkuHealthResponse {
    pub fn new(merchant_code: Option<&str>) -> Self {
        Self {
            status: "ok",
            message: "Duitku callback endpoint is active",
            merchant_code: mask_merchant_code(merchant_code),
        }
    }
}

fn mask_merchant_code(merchant_code: Option<&str>) -> String {
    match merchant_code.filter(|c| !c.is_empty()) {
        Some(code) => format!("{}...", code.chars().take(5).collect::<String>()),
        None => "Not set".to_string(),
    }
}
