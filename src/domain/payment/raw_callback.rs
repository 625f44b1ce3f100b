//! Verbatim capture of an inbound callback request.

use http::HeaderMap;
use std::net::IpAddr;

use crate::domain::foundation::{CallbackId, Timestamp};

use super::provider::Provider;

/// Immutable capture of one callback delivery.
///
/// The body is kept byte-for-byte as received. HMAC schemes sign those exact
/// bytes, so nothing here may re-encode or trim it.
#[derive(Debug, Clone)]
pub struct RawCallback {
    id: CallbackId,
    provider: Provider,
    body: Vec<u8>,
    headers: HeaderMap,
    remote_ip: Option<IpAddr>,
    received_at: Timestamp,
}

impl RawCallback {
    /// Captures a delivery received now.
    pub fn new(
        provider: Provider,
        body: impl Into<Vec<u8>>,
        headers: HeaderMap,
        remote_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            id: CallbackId::new(),
            provider,
            body: body.into(),
            headers,
            remote_ip,
            received_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> CallbackId {
        self.id
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Raw request body exactly as transmitted.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text. Lookup is case-insensitive.
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Socket peer address, if the transport exposed one.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.remote_ip
    }

    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }
}
