//! Payment provider configuration (Duitku, Tripay, Xendit)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::payment::{MissingTokenPolicy, SourceAllowlist, VerificationKeys};

use super::error::ValidationError;

/// Duitku configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuitkuConfig {
    /// Merchant code (shown masked on the health endpoint)
    pub merchant_code: Option<String>,

    /// API key used in the callback signature
    pub api_key: Option<SecretString>,

    /// Only accept callbacks from Duitku's published addresses
    #[serde(default)]
    pub ip_allowlist_enabled: bool,

    /// Use the first `X-Forwarded-For` entry as the client address
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl DuitkuConfig {
    /// Source allow-list for Duitku callbacks, if enabled
    pub fn source_allowlist(&self) -> Option<SourceAllowlist> {
        self.ip_allowlist_enabled
            .then(|| SourceAllowlist::duitku(self.trust_forwarded_for))
    }
}

/// Tripay configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripayConfig {
    /// Private key used to sign callbacks
    pub private_key: Option<SecretString>,
}

/// Xendit configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XenditConfig {
    /// Webhook verification token
    pub webhook_token: Option<SecretString>,

    /// What to do with webhooks when no token is set; required in that case
    pub missing_token_policy: Option<MissingTokenPolicy>,
}

impl XenditConfig {
    /// Validate Xendit configuration
    ///
    /// Without a token the policy must be chosen explicitly.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if non_empty(&self.webhook_token).is_none() && self.missing_token_policy.is_none() {
            return Err(ValidationError::XenditTokenPolicyRequired);
        }
        Ok(())
    }
}

/// Builds the verifier keys from provider sections.
///
/// Empty secrets count as unset.
pub fn verification_keys(
    duitku: &DuitkuConfig,
    tripay: &TripayConfig,
    xendit: &XenditConfig,
) -> VerificationKeys {
    VerificationKeys {
        duitku_api_key: non_empty(&duitku.api_key),
        tripay_private_key: non_empty(&tripay.private_key),
        xendit_webhook_token: non_empty(&xendit.webhook_token),
        xendit_missing_token_policy: xendit
            .missing_token_policy
            .unwrap_or(MissingTokenPolicy::Reject),
    }
}

fn non_empty(secret: &Option<SecretString>) -> Option<SecretString> {
    secret
        .as_ref()
        .filter(|s| !s.expose_secret().is_empty())
        .cloned()
}
