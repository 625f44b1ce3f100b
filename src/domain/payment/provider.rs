//! Payment providers that deliver callbacks to this service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::signature::SignatureScheme;

/// A payment gateway whose callbacks are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Duitku,
    Tripay,
    Xendit,
}

impl Provider {
    /// Stable lowercase identifier, used in idempotency keys and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Duitku => "duitku",
            Provider::Tripay => "tripay",
            Provider::Xendit => "xendit",
        }
    }

    /// The signing recipe this provider uses for its callbacks.
    pub fn signature_scheme(&self) -> SignatureScheme {
        match self {
            Provider::Duitku => SignatureScheme::Md5FieldConcat,
            Provider::Tripay => SignatureScheme::HmacSha256RawBody {
                header: "X-Callback-Signature",
            },
            Provider::Xendit => SignatureScheme::HmacSha256RawBody {
                header: "x-xendit-signature",
            },
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duitku" => Ok(Provider::Duitku),
            "tripay" => Ok(Provider::Tripay),
            "xendit" => Ok(Provider::Xendit),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}
