//! Canonical payment status and its state machine.
//!
//! ```text
//! Pending --> Paid     (terminal)
//! Pending --> Failed   (terminal)
//! Pending --> Expired  (terminal)
//! ```
//!
//! `Unknown` is not part of the lifecycle; it marks a callback whose status
//! vocabulary was not recognized and never changes order state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider-agnostic outcome of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    Unknown,
}

impl PaymentStatus {
    /// Returns true for outcomes after which no further transition happens.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Paid | PaymentStatus::Failed | PaymentStatus::Expired
        )
    }

    /// Returns true if an order in `self` may move to `target`.
    pub fn can_transition_to(&self, target: &PaymentStatus) -> bool {
        match (self, target) {
            (PaymentStatus::Pending, t) => t.is_terminal() || *t == PaymentStatus::Pending,
            _ => false,
        }
    }

    /// Lowercase name used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "expired" => Ok(PaymentStatus::Expired),
            "unknown" => Ok(PaymentStatus::Unknown),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}
