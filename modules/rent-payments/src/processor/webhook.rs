use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::ProcessorError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Verify a webhook signature
///
/// # Arguments
///
/// * `raw_body` - The raw, unparsed request body
/// * `signature` - The signature header, `t=<unix>,v1=<hex>[,v1=<hex>…]`
/// * `webhook_secret` - The endpoint's signing secret
/// * `tolerance` - The maximum allowed time difference in seconds (default: 300)
///
/// Any `v1` entry may match; the processor sends several while a secret is
/// being rolled.
pub fn verify_webhook_signature(
    raw_body: &[u8],
    signature: &str,
    webhook_secret: &str,
    tolerance: Option<i64>,
) -> Result<(), ProcessorError> {
    let tolerance = tolerance.unwrap_or(300);

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in signature.split(',').map(str::trim) {
        if let Some(value) = part.strip_prefix("t=") {
            timestamp = Some(value);
        } else if let Some(value) = part.strip_prefix("v1=") {
            candidates.push(value);
        }
    }

    let timestamp = timestamp.ok_or(ProcessorError::WebhookVerificationFailed)?;
    if candidates.is_empty() {
        return Err(ProcessorError::WebhookVerificationFailed);
    }

    // Check timestamp tolerance (prevent replay attacks)
    let webhook_time = timestamp
        .parse::<i64>()
        .map_err(|_| ProcessorError::WebhookVerificationFailed)?;

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ProcessorError::WebhookVerificationFailed)?
        .as_secs() as i64;

    if (current_time - webhook_time).abs() > tolerance {
        return Err(ProcessorError::WebhookVerificationFailed);
    }

    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|_| ProcessorError::WebhookVerificationFailed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|received| mac.clone().verify_slice(&received).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(ProcessorError::WebhookVerificationFailed)
    }
}

/// Compute the signature header for `raw_body` at `timestamp`, in the
/// format the processor sends.
pub fn sign_payload(
    raw_body: &[u8],
    timestamp: i64,
    webhook_secret: &str,
) -> Result<String, ProcessorError> {
    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|e| ProcessorError::ConfigError(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Event envelope delivered to the webhook endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Charge object as carried by `charge.*` events
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeObject {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// Dispute object as carried by `charge.dispute.*` events
#[derive(Debug, Clone, Deserialize)]
pub struct DisputeObject {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
}
