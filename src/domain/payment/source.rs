//! Source address allow-list for providers that publish their callback IPs.

use http::HeaderMap;
use std::net::IpAddr;

/// Duitku sandbox callback origins.
pub const DUITKU_SANDBOX_IPS: [&str; 4] = [
    "182.23.85.11",
    "182.23.85.12",
    "103.177.101.187",
    "103.177.101.188",
];

/// Duitku production callback origins.
pub const DUITKU_PRODUCTION_IPS: [&str; 10] = [
    "182.23.85.8",
    "182.23.85.9",
    "182.23.85.10",
    "182.23.85.13",
    "182.23.85.14",
    "103.177.101.184",
    "103.177.101.185",
    "103.177.101.186",
    "103.177.101.189",
    "103.177.101.190",
];

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Set of addresses a provider may call from.
///
/// Providers without an allow-list are not checked at all.
#[derive(Debug, Clone)]
pub struct SourceAllowlist {
    trust_forwarded_for: bool,
    addresses: Vec<IpAddr>,
}

impl SourceAllowlist {
    pub fn new(addresses: Vec<IpAddr>, trust_forwarded_for: bool) -> Self {
        Self {
            trust_forwarded_for,
            addresses,
        }
    }

    /// Duitku's published sandbox and production addresses.
    pub fn duitku(trust_forwarded_for: bool) -> Self {
        let addresses = DUITKU_SANDBOX_IPS
            .iter()
            .chain(DUITKU_PRODUCTION_IPS.iter())
            .filter_map(|ip| ip.parse().ok())
            .collect();
        Self::new(addresses, trust_forwarded_for)
    }

    /// Picks the address to check: the first `X-Forwarded-For` entry when
    /// proxies are trusted, the socket peer otherwise.
    pub fn client_ip(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> Option<IpAddr> {
        if self.trust_forwarded_for {
            let forwarded = headers
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|first| first.trim().parse().ok());
            if forwarded.is_some() {
                return forwarded;
            }
        }
        peer
    }

    /// Returns true if the request may proceed.
    pub fn admits(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> bool {
        match self.client_ip(peer, headers) {
            Some(ip) => self.addresses.contains(&ip),
            None => false,
        }
    }
}
