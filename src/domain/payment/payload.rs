//! Provider payload shapes.
//!
//! Each provider's body is decoded into its own typed struct, wrapped in
//! [`ProviderPayload`]. Decoding only happens on a [`VerifiedCallback`], so no
//! parsed field can be observed before the signature check passed.

use serde::Deserialize;
use serde_json::Value;

use super::errors::CallbackError;
use super::provider::Provider;
use super::signature::VerifiedCallback;

/// Header Tripay uses to name the callback kind.
pub const TRIPAY_EVENT_HEADER: &str = "X-Callback-Event";

/// Duitku callback, sent as `application/x-www-form-urlencoded`.
///
/// All values stay in the provider's string form; `amount` in particular is
/// signed as received, so it must not be re-formatted before verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DuitkuPayload {
    pub merchant_code: String,
    pub amount: String,
    pub merchant_order_id: String,
    pub product_details: String,
    pub payment_code: String,
    pub result_code: String,
    pub reference: String,
    pub signature: String,
    pub publisher_order_id: String,
    pub settlement_date: String,
    pub issuer_code: String,
}

impl DuitkuPayload {
    /// Decodes a form-encoded body. Repeated fields are rejected.
    pub fn from_form(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes(body)
    }
}

/// Tripay payment status callback (JSON).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TripayPayload {
    pub reference: Option<String>,
    pub merchant_ref: Option<String>,
    pub payment_method: Option<String>,
    pub payment_method_code: Option<String>,
    pub total_amount: Option<Value>,
    pub amount_received: Option<Value>,
    pub status: Option<String>,
    pub note: Option<String>,
    /// Value of the `X-Callback-Event` header, when sent.
    #[serde(skip)]
    pub callback_event: Option<String>,
}

/// Xendit payment request webhook (JSON).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct XenditPayload {
    pub event: Option<String>,
    pub business_id: Option<String>,
    pub created: Option<String>,
    pub data: Option<XenditPaymentData>,
}

/// The `data` object of a Xendit payment request webhook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct XenditPaymentData {
    pub id: Option<String>,
    pub reference_id: Option<String>,
    pub amount: Option<Value>,
    pub request_amount: Option<Value>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub failure_code: Option<String>,
}

/// A decoded, authenticated callback body.
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    Duitku(DuitkuPayload),
    Tripay(TripayPayload),
    Xendit(XenditPayload),
}

impl ProviderPayload {
    /// Decodes the verified body in the provider's declared format.
    ///
    /// # Errors
    ///
    /// Returns `CallbackError::MalformedPayload` if the body does not parse.
    pub fn decode(callback: &VerifiedCallback) -> Result<Self, CallbackError> {
        let raw = callback.raw();
        match raw.provider() {
            Provider::Duitku => DuitkuPayload::from_form(raw.body())
                .map(ProviderPayload::Duitku)
                .map_err(|e| CallbackError::MalformedPayload(e.to_string())),
            Provider::Tripay => {
                let mut payload: TripayPayload = serde_json::from_slice(raw.body())
                    .map_err(|e| CallbackError::MalformedPayload(e.to_string()))?;
                payload.callback_event = raw.header(TRIPAY_EVENT_HEADER).map(str::to_string);
                Ok(ProviderPayload::Tripay(payload))
            }
            Provider::Xendit => serde_json::from_slice(raw.body())
                .map(ProviderPayload::Xendit)
                .map_err(|e| CallbackError::MalformedPayload(e.to_string())),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderPayload::Duitku(_) => Provider::Duitku,
            ProviderPayload::Tripay(_) => Provider::Tripay,
            ProviderPayload::Xendit(_) => Provider::Xendit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::signature::VerifiedCallback;
    use crate::domain::payment::RawCallback;
    use http::{HeaderMap, HeaderValue};

    fn verified(provider: Provider, body: &str, headers: HeaderMap) -> VerifiedCallback {
        VerifiedCallback::assume_verified(RawCallback::new(provider, body, headers, None))
    }

    #[test]
    fn decodes_duitku_form_fields() {
        let body = "merchantCode=D1234&amount=10000&merchantOrderId=ORDER-1&resultCode=00\
                    &reference=DK123&signature=abc&spUserHash=xyz";
        let payload = ProviderPayload::decode(&verified(Provider::Duitku, body, HeaderMap::new()))
            .unwrap();

        match payload {
            ProviderPayload::Duitku(p) => {
                assert_eq!(p.merchant_code, "D1234");
                assert_eq!(p.amount, "10000");
                assert_eq!(p.merchant_order_id, "ORDER-1");
                assert_eq!(p.result_code, "00");
                assert_eq!(p.reference, "DK123");
                assert_eq!(p.signature, "abc");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn duitku_missing_fields_default_to_empty() {
        let p = DuitkuPayload::from_form(b"merchantCode=D1234").unwrap();
        assert_eq!(p.merchant_code, "D1234");
        assert!(p.signature.is_empty());
        assert!(p.reference.is_empty());
    }

    #[test]
    fn duitku_rejects_repeated_fields() {
        assert!(DuitkuPayload::from_form(b"amount=1&amount=2").is_err());
    }

    #[test]
    fn decodes_tripay_and_captures_event_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-callback-event", HeaderValue::from_static("payment_status"));
        let body = r#"{"reference":"T0001","merchant_ref":"INV-1","status":"PAID","total_amount":10000}"#;

        let payload = ProviderPayload::decode(&verified(Provider::Tripay, body, headers)).unwrap();

        match payload {
            ProviderPayload::Tripay(p) => {
                assert_eq!(p.reference.as_deref(), Some("T0001"));
                assert_eq!(p.merchant_ref.as_deref(), Some("INV-1"));
                assert_eq!(p.status.as_deref(), Some("PAID"));
                assert_eq!(p.callback_event.as_deref(), Some("payment_status"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn tripay_invalid_json_is_malformed() {
        let result =
            ProviderPayload::decode(&verified(Provider::Tripay, "{not json", HeaderMap::new()));
        assert!(matches!(result, Err(CallbackError::MalformedPayload(_))));
    }

    #[test]
    fn decodes_xendit_with_nested_data() {
        let body = r#"{"event":"payment_request.failed","data":{"id":"pr1","reference_id":"ref1"}}"#;
        let payload = ProviderPayload::decode(&verified(Provider::Xendit, body, HeaderMap::new()))
            .unwrap();

        assert_eq!(payload.provider(), Provider::Xendit);
        match payload {
            ProviderPayload::Xendit(p) => {
                assert_eq!(p.event.as_deref(), Some("payment_request.failed"));
                let data = p.data.unwrap();
                assert_eq!(data.id.as_deref(), Some("pr1"));
                assert_eq!(data.reference_id.as_deref(), Some("ref1"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn xendit_null_data_is_accepted() {
        let body = r#"{"event":"payment_request.something_new","data":null}"#;
        let payload = ProviderPayload::decode(&verified(Provider::Xendit, body, HeaderMap::new()));
        assert!(payload.is_ok());
    }

    #[test]
    fn xendit_invalid_json_is_malformed() {
        let result = ProviderPayload::decode(&verified(Provider::Xendit, "", HeaderMap::new()));
        assert!(matches!(result, Err(CallbackError::MalformedPayload(_))));
    }
}
