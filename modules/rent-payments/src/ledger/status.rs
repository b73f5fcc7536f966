use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a ledger entry.
///
/// There is no persisted `pending` state: a record is only written once the
/// processor reports an outcome.
///
/// ```text
///   (none) ──► succeeded ──► refunded
///     │          │  ▲   └──► disputed
///     │          ▼  │
///     └──────► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Refunded,
    Disputed,
}

/// Result of applying a requested status to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one (re-delivery).
    Unchanged,
    Changed {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal payment status transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Disputed => "disputed",
        }
    }

    /// Whether a brand new record may be created in this state.
    pub fn is_initial(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Failed)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        matches!(
            (self, next),
            (Succeeded, Failed)
                | (Succeeded, Refunded)
                | (Succeeded, Disputed)
                | (Failed, Succeeded)
        )
    }

    pub fn transition(self, next: PaymentStatus) -> Result<Transition, IllegalTransition> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        if self.can_transition_to(next) {
            Ok(Transition::Changed {
                from: self,
                to: next,
            })
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown payment status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            "disputed" => Ok(PaymentStatus::Disputed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
