use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::PaymentStatus;

/// Ledger entry from the payment_records table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub external_reference: String,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome observed from the processor, not yet written to the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRecord {
    pub owner_user_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub external_reference: String,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

impl NewPaymentRecord {
    /// Note stored on every record. Later events only move the status, so the
    /// note names the payment and never its outcome.
    pub fn note_for(external_reference: &str) -> String {
        format!("Online payment via Stripe ({external_reference})")
    }

    pub(crate) fn into_record(self, now: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            owner_user_id: self.owner_user_id,
            client_id: self.client_id,
            amount: self.amount,
            payment_date: self.payment_date,
            external_reference: self.external_reference,
            status: self.status,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Response body for POST /api/payments/intents
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// Request body for POST /api/payments/confirmations
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Response body for GET /api/payments/payout-account
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAccountStatus {
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub ready: bool,
}

/// Response body for POST /api/payments/payout-account/links
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingLinkResponse {
    pub url: String,
    pub expires_at: Option<i64>,
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
