//! Maps provider payloads onto [`NormalizedEvent`].
//!
//! | Provider | Raw signal                              | Status  |
//! |----------|-----------------------------------------|---------|
//! | Duitku   | `resultCode == "00"`                    | Paid    |
//! | Duitku   | any other `resultCode`                  | Failed  |
//! | Tripay   | `PAID` / `EXPIRED` / `FAILED` / `UNPAID` | Paid / Expired / Failed / Pending |
//! | Xendit   | `payment_request.succeeded`             | Paid    |
//! | Xendit   | `payment_request.failed`                | Failed  |
//! | Xendit   | `payment_request.expired`               | Expired |
//!
//! Anything else is `Unknown`. Unknown events skip amount validation since
//! they never reach order state.

use serde_json::Value;

use crate::domain::foundation::Timestamp;

use super::errors::NormalizationError;
use super::event::NormalizedEvent;
use super::payload::{DuitkuPayload, ProviderPayload, TripayPayload, XenditPayload};
use super::provider::Provider;
use super::status::PaymentStatus;

const DUITKU_SUCCESS: &str = "00";
const TRIPAY_PAYMENT_STATUS_EVENT: &str = "payment_status";

/// Normalizes a decoded payload received at `received_at`.
///
/// # Errors
///
/// - `MissingField` when an id or amount a known status needs is absent
/// - `InvalidAmount` when an amount is not a non-negative integer
pub fn normalize(
    payload: &ProviderPayload,
    received_at: Timestamp,
) -> Result<NormalizedEvent, NormalizationError> {
    match payload {
        ProviderPayload::Duitku(p) => normalize_duitku(p, received_at),
        ProviderPayload::Tripay(p) => normalize_tripay(p, received_at),
        ProviderPayload::Xendit(p) => normalize_xendit(p, received_at),
    }
}

fn normalize_duitku(
    p: &DuitkuPayload,
    received_at: Timestamp,
) -> Result<NormalizedEvent, NormalizationError> {
    let status = if p.result_code == DUITKU_SUCCESS {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    };

    if p.amount.is_empty() {
        return Err(NormalizationError::MissingField("amount"));
    }
    let amount = parse_amount_str("amount", &p.amount)?;

    let external_reference = if p.reference.is_empty() {
        &p.merchant_order_id
    } else {
        &p.reference
    };

    NormalizedEvent::new(
        Provider::Duitku,
        external_reference.as_str(),
        p.merchant_order_id.as_str(),
        status,
        amount,
        p.result_code.as_str(),
        received_at,
    )
}

fn normalize_tripay(
    p: &TripayPayload,
    received_at: Timestamp,
) -> Result<NormalizedEvent, NormalizationError> {
    let raw_status = p.status.as_deref().unwrap_or_default();

    let is_status_event = p
        .callback_event
        .as_deref()
        .map_or(true, |event| event == TRIPAY_PAYMENT_STATUS_EVENT);

    let status = if !is_status_event {
        PaymentStatus::Unknown
    } else {
        match raw_status {
            "PAID" => PaymentStatus::Paid,
            "EXPIRED" => PaymentStatus::Expired,
            "FAILED" => PaymentStatus::Failed,
            "UNPAID" => PaymentStatus::Pending,
            _ => PaymentStatus::Unknown,
        }
    };

    let merchant_ref = non_empty(p.merchant_ref.as_deref()).unwrap_or_default();
    let external_reference = non_empty(p.reference.as_deref()).unwrap_or(merchant_ref);

    let amount = match status {
        PaymentStatus::Unknown => 0,
        _ => match &p.total_amount {
            Some(value) => parse_amount_value("total_amount", value)?,
            None => return Err(NormalizationError::MissingField("total_amount")),
        },
    };

    NormalizedEvent::new(
        Provider::Tripay,
        external_reference,
        merchant_ref,
        status,
        amount,
        raw_status,
        received_at,
    )
}

fn normalize_xendit(
    p: &XenditPayload,
    received_at: Timestamp,
) -> Result<NormalizedEvent, NormalizationError> {
    let event = p.event.as_deref().unwrap_or_default();

    let status = match event {
        "payment_request.succeeded" => PaymentStatus::Paid,
        "payment_request.failed" => PaymentStatus::Failed,
        "payment_request.expired" => PaymentStatus::Expired,
        _ => PaymentStatus::Unknown,
    };

    let data = p.data.as_ref();
    let reference_id = non_empty(data.and_then(|d| d.reference_id.as_deref()));
    let request_id = non_empty(data.and_then(|d| d.id.as_deref()));
    let external_reference = reference_id.or(request_id).unwrap_or_default();

    let amount = match status {
        PaymentStatus::Unknown => 0,
        _ => {
            let raw_amount = data
                .and_then(|d| {
                    d.amount
                        .as_ref()
                        .map(|v| ("data.amount", v))
                        .or_else(|| d.request_amount.as_ref().map(|v| ("data.request_amount", v)))
                })
                .filter(|(_, v)| !v.is_null());
            match raw_amount {
                Some((field, value)) => parse_amount_value(field, value)?,
                None => 0,
            }
        }
    };

    NormalizedEvent::new(
        Provider::Xendit,
        external_reference,
        reference_id.unwrap_or_default(),
        status,
        amount,
        event,
        received_at,
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Parses a plain digit string. Signs, separators and decimals are rejected.
fn parse_amount_str(field: &'static str, value: &str) -> Result<u64, NormalizationError> {
    let invalid = || NormalizationError::InvalidAmount {
        field,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse::<u64>().map_err(|_| invalid())
}

/// Parses a JSON amount given as an integer or a digit string.
fn parse_amount_value(field: &'static str, value: &Value) -> Result<u64, NormalizationError> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| NormalizationError::InvalidAmount {
            field,
            value: n.to_string(),
        }),
        Value::String(s) => parse_amount_str(field, s),
        other => Err(NormalizationError::InvalidAmount {
            field,
            value: other.to_string(),
        }),
    }
}
