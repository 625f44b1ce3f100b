//! Callback signature verification.
//!
//! Every provider signs its callbacks differently:
//!
//! | Provider | Digest      | Key            | Message                                          | Location                     |
//! |----------|-------------|----------------|--------------------------------------------------|------------------------------|
//! | Duitku   | MD5         | (appended)     | merchantCode + amount + merchantOrderId + apiKey | `signature` form field       |
//! | Tripay   | HMAC-SHA256 | private key    | raw body bytes                                   | `X-Callback-Signature` header |
//! | Xendit   | HMAC-SHA256 | webhook token  | raw body bytes                                   | `x-xendit-signature` header  |
//!
//! Received signatures are hex-decoded and compared against the computed
//! digest with a constant-time comparison. Verification reads no process
//! state: keys arrive in a [`VerificationKeys`] built once at start-up.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::payload::DuitkuPayload;
use super::provider::Provider;
use super::raw_callback::RawCallback;

/// How a provider authenticates its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// MD5 over the concatenated `merchantCode`, `amount`, `merchantOrderId`
    /// form values followed by the API key.
    Md5FieldConcat,
    /// HMAC-SHA256 over the raw request body, hex signature in `header`.
    HmacSha256RawBody { header: &'static str },
}

/// Signature verification failure. Every variant is terminal for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signature missing")]
    Missing,

    #[error("Invalid signature")]
    Invalid,

    /// The signed fields live inside a body that does not decode.
    #[error("Callback body could not be decoded")]
    Unreadable,
}

/// What to do with Xendit callbacks when no webhook token is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTokenPolicy {
    /// Reject every callback (fail closed).
    Reject,
    /// Accept callbacks without verification, logging each one.
    AcceptUnverified,
}

/// Provider secrets used for verification.
///
/// A provider without a configured secret has all of its callbacks rejected,
/// except Xendit under [`MissingTokenPolicy::AcceptUnverified`].
#[derive(Debug, Clone)]
pub struct VerificationKeys {
    pub duitku_api_key: Option<SecretString>,
    pub tripay_private_key: Option<SecretString>,
    pub xendit_webhook_token: Option<SecretString>,
    pub xendit_missing_token_policy: MissingTokenPolicy,
}

/// A callback whose origin has been authenticated.
///
/// Only [`CallbackVerifier::verify`] constructs this, so holding one proves the
/// signature check ran.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    raw: RawCallback,
}

impl VerifiedCallback {
    pub fn raw(&self) -> &RawCallback {
        &self.raw
    }

    #[cfg(test)]
    pub(crate) fn assume_verified(raw: RawCallback) -> Self {
        Self { raw }
    }
}

/// Verifies callbacks for every provider against the configured keys.
#[derive(Debug, Clone)]
pub struct CallbackVerifier {
    keys: VerificationKeys,
}

impl CallbackVerifier {
    pub fn new(keys: VerificationKeys) -> Self {
        Self { keys }
    }

    /// Authenticates a raw callback.
    ///
    /// # Errors
    ///
    /// - `Missing` - the provider's signature field or header is absent
    /// - `Invalid` - the signature does not match, or no key is configured
    /// - `Unreadable` - a Duitku form body does not decode
    pub fn verify(&self, raw: RawCallback) -> Result<VerifiedCallback, SignatureError> {
        match raw.provider().signature_scheme() {
            SignatureScheme::Md5FieldConcat => self.verify_duitku(&raw)?,
            SignatureScheme::HmacSha256RawBody { header } => {
                self.verify_raw_body(&raw, header)?
            }
        }
        Ok(VerifiedCallback { raw })
    }

    fn verify_duitku(&self, raw: &RawCallback) -> Result<(), SignatureError> {
        let fields =
            DuitkuPayload::from_form(raw.body()).map_err(|_| SignatureError::Unreadable)?;
        if fields.signature.is_empty() {
            return Err(SignatureError::Missing);
        }

        let api_key = self.keys.duitku_api_key.as_ref().ok_or_else(|| {
            tracing::warn!(callback_id = %raw.id(), "Duitku API key not configured, rejecting callback");
            SignatureError::Invalid
        })?;

        if verify_duitku_signature(
            &fields.merchant_code,
            &fields.amount,
            &fields.merchant_order_id,
            api_key,
            &fields.signature,
        ) {
            Ok(())
        } else {
            Err(SignatureError::Invalid)
        }
    }

    fn verify_raw_body(&self, raw: &RawCallback, header: &str) -> Result<(), SignatureError> {
        let key = match raw.provider() {
            Provider::Tripay => self.keys.tripay_private_key.as_ref(),
            Provider::Xendit => self.keys.xendit_webhook_token.as_ref(),
            Provider::Duitku => None,
        };

        let key = match key {
            Some(key) => key,
            None => return self.without_key(raw),
        };

        let received = raw.header(header).ok_or(SignatureError::Missing)?;

        if verify_hmac_sha256(key.expose_secret().as_bytes(), raw.body(), received) {
            Ok(())
        } else {
            Err(SignatureError::Invalid)
        }
    }

    fn without_key(&self, raw: &RawCallback) -> Result<(), SignatureError> {
        if raw.provider() == Provider::Xendit
            && self.keys.xendit_missing_token_policy == MissingTokenPolicy::AcceptUnverified
        {
            tracing::warn!(
                callback_id = %raw.id(),
                "Xendit webhook token not configured, accepting callback without verification"
            );
            return Ok(());
        }

        tracing::warn!(
            callback_id = %raw.id(),
            provider = %raw.provider(),
            "No signing key configured, rejecting callback"
        );
        Err(SignatureError::Invalid)
    }
}

/// Computes the Duitku callback signature as lowercase hex.
pub fn duitku_signature(
    merchant_code: &str,
    amount: &str,
    merchant_order_id: &str,
    api_key: &SecretString,
) -> String {
    hex::encode(duitku_digest(merchant_code, amount, merchant_order_id, api_key))
}

/// Returns true iff `received_hex` is MD5(merchantCode ‖ amount ‖ merchantOrderId ‖ apiKey).
pub fn verify_duitku_signature(
    merchant_code: &str,
    amount: &str,
    merchant_order_id: &str,
    api_key: &SecretString,
    received_hex: &str,
) -> bool {
    let expected = duitku_digest(merchant_code, amount, merchant_order_id, api_key);
    match hex::decode(received_hex) {
        Ok(received) => constant_time_compare(&expected, &received),
        Err(_) => false,
    }
}

fn duitku_digest(
    merchant_code: &str,
    amount: &str,
    merchant_order_id: &str,
    api_key: &SecretString,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(merchant_code.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(merchant_order_id.as_bytes());
    hasher.update(api_key.expose_secret().as_bytes());
    hasher.finalize().to_vec()
}

/// Computes HMAC-SHA256 of `message` as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Returns true iff `received_hex` is HMAC-SHA256(key, message).
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], received_hex: &str) -> bool {
    let expected = hmac_sha256(key, message);
    match hex::decode(received_hex.trim()) {
        Ok(received) => constant_time_compare(&expected, &received),
        Err(_) => false,
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match Hmac::<Sha256>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts any key length"),
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};

    const DUITKU_KEY: &str = "secretkey";
    const TRIPAY_KEY: &str = "tripay-private-key";
    const XENDIT_TOKEN: &str = "xendit-webhook-token";

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn keys() -> VerificationKeys {
        VerificationKeys {
            duitku_api_key: Some(secret(DUITKU_KEY)),
            tripay_private_key: Some(secret(TRIPAY_KEY)),
            xendit_webhook_token: Some(secret(XENDIT_TOKEN)),
            xendit_missing_token_policy: MissingTokenPolicy::Reject,
        }
    }

    fn with_header(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn duitku_body(signature: &str) -> String {
        format!(
            "merchantCode=D1234&amount=10000&merchantOrderId=ORDER-1&resultCode=00&signature={}",
            signature
        )
    }

    // ══════════════════════════════════════════════════════════════
    // Duitku
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn duitku_signature_is_md5_of_concatenation() {
        let expected = hex::encode(Md5::digest(b"D123410000ORDER-1secretkey"));
        assert_eq!(
            duitku_signature("D1234", "10000", "ORDER-1", &secret(DUITKU_KEY)),
            expected
        );
    }

    #[test]
    fn duitku_valid_signature_verifies() {
        let signature = duitku_signature("D1234", "10000", "ORDER-1", &secret(DUITKU_KEY));
        let raw = RawCallback::new(Provider::Duitku, duitku_body(&signature), HeaderMap::new(), None);

        assert!(CallbackVerifier::new(keys()).verify(raw).is_ok());
    }

    #[test]
    fn duitku_uppercase_hex_signature_verifies() {
        let signature =
            duitku_signature("D1234", "10000", "ORDER-1", &secret(DUITKU_KEY)).to_uppercase();
        let raw = RawCallback::new(Provider::Duitku, duitku_body(&signature), HeaderMap::new(), None);

        assert!(CallbackVerifier::new(keys()).verify(raw).is_ok());
    }

    #[test]
    fn duitku_amount_is_signed_as_received() {
        // "10000.00" is the same number but a different string.
        let signature = duitku_signature("D1234", "10000.00", "ORDER-1", &secret(DUITKU_KEY));
        let raw = RawCallback::new(Provider::Duitku, duitku_body(&signature), HeaderMap::new(), None);

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn duitku_wrong_key_fails() {
        let signature = duitku_signature("D1234", "10000", "ORDER-1", &secret("other"));
        let raw = RawCallback::new(Provider::Duitku, duitku_body(&signature), HeaderMap::new(), None);

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn duitku_undecodable_form_is_unreadable() {
        let raw = RawCallback::new(
            Provider::Duitku,
            "amount=1&amount=2&signature=abc",
            HeaderMap::new(),
            None,
        );

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert_eq!(result.err(), Some(SignatureError::Unreadable));
    }

    #[test]
    fn duitku_missing_signature_field() {
        let raw = RawCallback::new(
            Provider::Duitku,
            "merchantCode=D1234&amount=10000&merchantOrderId=ORDER-1",
            HeaderMap::new(),
            None,
        );

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Missing)));
    }

    #[test]
    fn duitku_non_hex_signature_fails() {
        let raw = RawCallback::new(Provider::Duitku, duitku_body("zzzz"), HeaderMap::new(), None);

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn duitku_without_api_key_fails_closed() {
        let signature = duitku_signature("D1234", "10000", "ORDER-1", &secret(DUITKU_KEY));
        let raw = RawCallback::new(Provider::Duitku, duitku_body(&signature), HeaderMap::new(), None);
        let keys = VerificationKeys {
            duitku_api_key: None,
            ..keys()
        };

        let result = CallbackVerifier::new(keys).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    // ══════════════════════════════════════════════════════════════
    // Tripay
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn tripay_signature_over_raw_body_verifies() {
        let body = r#"{"reference":"T1","merchant_ref":"INV-1","status":"PAID"}"#;
        let signature = hmac_sha256_hex(TRIPAY_KEY.as_bytes(), body.as_bytes());
        let raw = RawCallback::new(
            Provider::Tripay,
            body,
            with_header("x-callback-signature", &signature),
            None,
        );

        assert!(CallbackVerifier::new(keys()).verify(raw).is_ok());
    }

    #[test]
    fn tripay_reordered_keys_verify_when_bytes_match() {
        let body = r#"{"status":"PAID","merchant_ref":"INV-1","reference":"T1"}"#;
        let signature = hmac_sha256_hex(TRIPAY_KEY.as_bytes(), body.as_bytes());
        let raw = RawCallback::new(
            Provider::Tripay,
            body,
            with_header("x-callback-signature", &signature),
            None,
        );

        assert!(CallbackVerifier::new(keys()).verify(raw).is_ok());
    }

    #[test]
    fn tripay_reserialized_body_fails() {
        let sent = r#"{"reference": "T1", "status": "PAID"}"#;
        let signature = hmac_sha256_hex(TRIPAY_KEY.as_bytes(), sent.as_bytes());
        let value: serde_json::Value = serde_json::from_str(sent).unwrap();
        let reserialized = serde_json::to_string(&value).unwrap();
        assert_ne!(reserialized, sent);

        let raw = RawCallback::new(
            Provider::Tripay,
            reserialized,
            with_header("x-callback-signature", &signature),
            None,
        );

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn tripay_missing_header() {
        let raw = RawCallback::new(Provider::Tripay, "{}", HeaderMap::new(), None);

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Missing)));
    }

    #[test]
    fn tripay_without_private_key_fails_closed() {
        let body = "{}";
        let signature = hmac_sha256_hex(TRIPAY_KEY.as_bytes(), body.as_bytes());
        let raw = RawCallback::new(
            Provider::Tripay,
            body,
            with_header("x-callback-signature", &signature),
            None,
        );
        let keys = VerificationKeys {
            tripay_private_key: None,
            ..keys()
        };

        let result = CallbackVerifier::new(keys).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    // ══════════════════════════════════════════════════════════════
    // Xendit
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn xendit_signature_verifies() {
        let body = r#"{"event":"payment_request.failed","data":{"id":"pr1","reference_id":"ref1"}}"#;
        let signature = hmac_sha256_hex(XENDIT_TOKEN.as_bytes(), body.as_bytes());
        let raw = RawCallback::new(
            Provider::Xendit,
            body,
            with_header("x-xendit-signature", &signature),
            None,
        );

        assert!(CallbackVerifier::new(keys()).verify(raw).is_ok());
    }

    #[test]
    fn xendit_tampered_body_fails() {
        let body = r#"{"event":"payment_request.failed"}"#;
        let signature = hmac_sha256_hex(XENDIT_TOKEN.as_bytes(), body.as_bytes());
        let raw = RawCallback::new(
            Provider::Xendit,
            r#"{"event":"payment_request.succeeded"}"#,
            with_header("x-xendit-signature", &signature),
            None,
        );

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn xendit_missing_header_when_token_configured() {
        let raw = RawCallback::new(Provider::Xendit, "{}", HeaderMap::new(), None);

        let result = CallbackVerifier::new(keys()).verify(raw);
        assert!(matches!(result, Err(SignatureError::Missing)));
    }

    #[test]
    fn xendit_without_token_rejects_under_reject_policy() {
        let raw = RawCallback::new(Provider::Xendit, "{}", HeaderMap::new(), None);
        let keys = VerificationKeys {
            xendit_webhook_token: None,
            xendit_missing_token_policy: MissingTokenPolicy::Reject,
            ..keys()
        };

        let result = CallbackVerifier::new(keys).verify(raw);
        assert!(matches!(result, Err(SignatureError::Invalid)));
    }

    #[test]
    fn xendit_without_token_accepts_under_explicit_opt_out() {
        let raw = RawCallback::new(Provider::Xendit, "{}", HeaderMap::new(), None);
        let keys = VerificationKeys {
            xendit_webhook_token: None,
            xendit_missing_token_policy: MissingTokenPolicy::AcceptUnverified,
            ..keys()
        };

        assert!(CallbackVerifier::new(keys).verify(raw).is_ok());
    }

    #[test]
    fn accept_policy_does_not_apply_to_tripay() {
        let raw = RawCallback::new(
            Provider::Tripay,
            "{}",
            with_header("x-callback-signature", "00"),
            None,
        );
        let keys = VerificationKeys {
            tripay_private_key: None,
            xendit_missing_token_policy: MissingTokenPolicy::AcceptUnverified,
            ..keys()
        };

        assert!(CallbackVerifier::new(keys).verify(raw).is_err());
    }

    #[test]
    fn missing_token_policy_deserializes_snake_case() {
        let policy: MissingTokenPolicy = serde_json::from_str("\"accept_unverified\"").unwrap();
        assert_eq!(policy, MissingTokenPolicy::AcceptUnverified);
    }

    #[test]
    fn keys_debug_output_redacts_secrets() {
        let debug = format!("{:?}", keys());
        assert!(!debug.contains(DUITKU_KEY));
        assert!(!debug.contains(TRIPAY_KEY));
        assert!(!debug.contains(XENDIT_TOKEN));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
