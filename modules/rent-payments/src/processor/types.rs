use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Common metadata type
pub type Metadata = HashMap<String, String>;

pub const PAYER_ID_KEY: &str = "payer_id";
pub const CLIENT_ID_KEY: &str = "client_id";
pub const PAYEE_ID_KEY: &str = "payee_id";

/// Connected payout account from the processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
}

impl PayoutAccount {
    pub fn is_ready(&self) -> bool {
        self.charges_enabled && self.payouts_enabled
    }
}

/// Payment intent from the processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub created: Option<i64>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Hosted onboarding link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLink {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Attribution carried on every intent this service creates.
///
/// `payee_id` is optional on read so intents created before it was recorded
/// can still be attributed through the client's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentMetadata {
    pub payer_id: Uuid,
    pub client_id: Uuid,
    pub payee_id: Option<Uuid>,
}

impl IntentMetadata {
    /// Parse attribution from processor metadata. The error names the first
    /// missing or malformed key.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, &'static str> {
        let uuid_at = |key: &'static str| {
            metadata
                .get(key)
                .and_then(|v| Uuid::parse_str(v).ok())
                .ok_or(key)
        };

        Ok(Self {
            payer_id: uuid_at(PAYER_ID_KEY)?,
            client_id: uuid_at(CLIENT_ID_KEY)?,
            payee_id: metadata
                .get(PAYEE_ID_KEY)
                .and_then(|v| Uuid::parse_str(v).ok()),
        })
    }

    /// Whether the intent names `user_id` as its payer
    pub fn payer_is(metadata: &Metadata, user_id: Uuid) -> bool {
        metadata
            .get(PAYER_ID_KEY)
            .and_then(|v| Uuid::parse_str(v).ok())
            == Some(user_id)
    }
}

/// Ephemeral request for a new intent; never persisted locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentParams {
    pub amount_minor: i64,
    pub currency: String,
    pub application_fee_minor: i64,
    pub destination_account: String,
    pub payer_id: Uuid,
    pub client_id: Uuid,
    pub payee_id: Uuid,
}

impl CreateIntentParams {
    /// Form fields for the processor's payment intent endpoint
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("amount".into(), self.amount_minor.to_string()),
            ("currency".into(), self.currency.clone()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
            (
                "application_fee_amount".into(),
                self.application_fee_minor.to_string(),
            ),
            (
                "transfer_data[destination]".into(),
                self.destination_account.clone(),
            ),
            (
                format!("metadata[{PAYER_ID_KEY}]"),
                self.payer_id.to_string(),
            ),
            (
                format!("metadata[{CLIENT_ID_KEY}]"),
                self.client_id.to_string(),
            ),
            (
                format!("metadata[{PAYEE_ID_KEY}]"),
                self.payee_id.to_string(),
            ),
        ]
    }
}
