//! Webhook reconciler.
//!
//! Verifies processor deliveries and folds them into the ledger. Deliveries
//! can arrive twice, out of order, or after the confirmation bridge already
//! wrote the record; every path here is a per-reference atomic write, so the
//! ledger converges to one record whatever the interleaving.
//!
//! Only store and processor failures are returned as errors (the processor
//! redelivers on 5xx). Events that cannot be applied are logged and
//! acknowledged.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::PaymentError;
use crate::ledger::{LedgerWrite, PaymentStatus};
use crate::models::NewPaymentRecord;
use crate::money::from_minor_units;
use crate::processor::webhook::{ChargeObject, DisputeObject, WebhookEvent};
use crate::processor::{IntentMetadata, PaymentIntent};
use crate::state::AppState;

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";
pub const CHARGE_REFUNDED: &str = "charge.refunded";
pub const DISPUTE_CREATED: &str = "charge.dispute.created";

/// What a verified delivery did to the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookDisposition {
    /// Ledger write attempted; the write says whether anything changed
    Applied(LedgerWrite),
    /// Event understood but could not be applied
    Skipped(SkipReason),
    /// Event type this service does not act on
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Intent metadata lacks the named key
    MissingMetadata(&'static str),
    /// No client or payee could be resolved for the intent
    UnknownOwner,
    /// Charge or dispute without a payment intent
    NoPaymentIntent,
    /// Nothing recorded yet for the payment intent
    UnknownPayment(String),
}

impl WebhookDisposition {
    fn outcome(&self) -> &'static str {
        match self {
            WebhookDisposition::Applied(LedgerWrite::Rejected { .. }) => "rejected",
            WebhookDisposition::Applied(_) => "applied",
            WebhookDisposition::Skipped(_) => "skipped",
            WebhookDisposition::Ignored => "ignored",
        }
    }
}

/// Verify and apply one webhook delivery.
pub async fn reconcile_webhook(
    state: &AppState,
    raw_body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookDisposition, PaymentError> {
    let signature = signature.ok_or_else(|| {
        tracing::warn!("webhook delivered without a signature header");
        PaymentError::SignatureInvalid
    })?;

    state
        .processor
        .verify_webhook_signature(raw_body, signature)
        .map_err(|e| {
            tracing::warn!(error = %e, "webhook signature rejected");
            PaymentError::SignatureInvalid
        })?;

    let event: WebhookEvent = serde_json::from_slice(raw_body)
        .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "webhook event received"
    );

    let result = dispatch(state, &event).await;

    let outcome = match &result {
        Ok(disposition) => disposition.outcome(),
        Err(_) => "error",
    };
    state
        .metrics
        .webhook_events_total
        .with_label_values(&[event.event_type.as_str(), outcome])
        .inc();

    if let Ok(disposition) = &result {
        log_disposition(&event, disposition);
    }

    result
}

async fn dispatch(
    state: &AppState,
    event: &WebhookEvent,
) -> Result<WebhookDisposition, PaymentError> {
    match event.event_type.as_str() {
        PAYMENT_SUCCEEDED => record_intent_outcome(state, event, PaymentStatus::Succeeded).await,
        PAYMENT_FAILED => record_intent_outcome(state, event, PaymentStatus::Failed).await,
        CHARGE_REFUNDED => {
            let charge: ChargeObject = parse_object(event)?;
            transition_existing(state, charge.payment_intent, PaymentStatus::Refunded).await
        }
        DISPUTE_CREATED => {
            let dispute: DisputeObject = parse_object(event)?;
            transition_existing(state, dispute.payment_intent, PaymentStatus::Disputed).await
        }
        _ => Ok(WebhookDisposition::Ignored),
    }
}

fn parse_object<T: serde::de::DeserializeOwned>(event: &WebhookEvent) -> Result<T, PaymentError> {
    serde_json::from_value(event.data.object.clone()).map_err(|e| {
        PaymentError::InvalidPayload(format!("{} object: {e}", event.event_type))
    })
}

/// `payment_intent.*`: insert the outcome or transition the existing record
async fn record_intent_outcome(
    state: &AppState,
    event: &WebhookEvent,
    status: PaymentStatus,
) -> Result<WebhookDisposition, PaymentError> {
    let intent: PaymentIntent = parse_object(event)?;

    let metadata = match IntentMetadata::from_metadata(&intent.metadata) {
        Ok(metadata) => metadata,
        Err(key) => {
            return Ok(WebhookDisposition::Skipped(SkipReason::MissingMetadata(key)));
        }
    };

    let Some(owner_user_id) = state.directory.owner_for(&metadata).await? else {
        return Ok(WebhookDisposition::Skipped(SkipReason::UnknownOwner));
    };

    let write = state
        .ledger
        .record_outcome(NewPaymentRecord {
            owner_user_id,
            client_id: metadata.client_id,
            amount: from_minor_units(intent.amount),
            payment_date: event_time(event),
            external_reference: intent.id.clone(),
            status,
            notes: Some(NewPaymentRecord::note_for(&intent.id)),
        })
        .await?;

    count_write(state, &write);
    Ok(WebhookDisposition::Applied(write))
}

/// `charge.*`: only ever moves a record that already exists
async fn transition_existing(
    state: &AppState,
    payment_intent: Option<String>,
    status: PaymentStatus,
) -> Result<WebhookDisposition, PaymentError> {
    let Some(reference) = payment_intent.filter(|id| !id.is_empty()) else {
        return Ok(WebhookDisposition::Skipped(SkipReason::NoPaymentIntent));
    };

    match state.ledger.apply_status(&reference, status).await? {
        Some(write) => {
            count_write(state, &write);
            Ok(WebhookDisposition::Applied(write))
        }
        None => Ok(WebhookDisposition::Skipped(SkipReason::UnknownPayment(
            reference,
        ))),
    }
}

fn count_write(state: &AppState, write: &LedgerWrite) {
    state
        .metrics
        .ledger_writes_total
        .with_label_values(&["webhook", write.label()])
        .inc();
}

fn event_time(event: &WebhookEvent) -> DateTime<Utc> {
    event
        .created
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

fn log_disposition(event: &WebhookEvent, disposition: &WebhookDisposition) {
    match disposition {
        WebhookDisposition::Applied(LedgerWrite::Rejected { record, requested }) => {
            tracing::warn!(
                event_id = %event.id,
                payment_intent_id = %record.external_reference,
                current = %record.status,
                requested = %requested,
                "illegal status transition ignored"
            );
        }
        WebhookDisposition::Applied(write) => {
            tracing::info!(
                event_id = %event.id,
                payment_intent_id = %write.record().external_reference,
                status = %write.record().status,
                result = write.label(),
                "payment record reconciled"
            );
        }
        WebhookDisposition::Skipped(SkipReason::MissingMetadata(key)) => {
            tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                missing = *key,
                "payment intent metadata incomplete; event acknowledged without a record"
            );
        }
        WebhookDisposition::Skipped(SkipReason::UnknownOwner) => {
            tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                "no owner found for payment intent; event acknowledged without a record"
            );
        }
        WebhookDisposition::Skipped(SkipReason::NoPaymentIntent) => {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                "event object carries no payment intent"
            );
        }
        WebhookDisposition::Skipped(SkipReason::UnknownPayment(reference)) => {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                payment_intent_id = %reference,
                "no payment record for payment intent"
            );
        }
        WebhookDisposition::Ignored => {
            tracing::debug!(event_type = %event.event_type, "unhandled webhook event type");
        }
    }
}
