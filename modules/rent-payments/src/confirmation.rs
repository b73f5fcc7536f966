//! Client confirmation bridge.
//!
//! After the browser confirms a payment the tenant reports the intent id
//! here. The intent is re-fetched from the processor so the caller's word is
//! never trusted, then recorded through the same atomic upsert the webhook
//! reconciler uses. Whichever of the two arrives first creates the record;
//! the other finds it already `succeeded` and leaves it alone.

use chrono::Utc;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::ledger::{LedgerWrite, PaymentStatus};
use crate::models::NewPaymentRecord;
use crate::money::from_minor_units;
use crate::processor::types::CLIENT_ID_KEY;
use crate::processor::IntentMetadata;
use crate::state::AppState;

pub async fn confirm_payment(
    state: &AppState,
    caller_id: Uuid,
    payment_intent_id: &str,
) -> Result<LedgerWrite, PaymentError> {
    let payment_intent_id = payment_intent_id.trim();
    if payment_intent_id.is_empty() {
        return Err(PaymentError::InvalidRequest(
            "paymentIntentId is required".to_string(),
        ));
    }
    // The id becomes a path segment of the processor URL
    if !is_processor_id(payment_intent_id) {
        return Err(PaymentError::InvalidRequest(
            "paymentIntentId is malformed".to_string(),
        ));
    }

    let intent = state
        .processor
        .retrieve_intent(payment_intent_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                PaymentError::InvalidRequest(format!(
                    "Unknown payment intent {payment_intent_id}"
                ))
            } else {
                PaymentError::Processor(e)
            }
        })?;

    // Ownership first: a foreign intent reveals nothing about its status
    if !IntentMetadata::payer_is(&intent.metadata, caller_id) {
        tracing::warn!(
            payment_intent_id = %intent.id,
            caller_id = %caller_id,
            "confirmation for a payment intent owned by another payer"
        );
        return Err(PaymentError::OwnershipMismatch);
    }

    if !intent.is_succeeded() {
        return Err(PaymentError::PaymentNotConfirmed(intent.status));
    }

    let metadata =
        IntentMetadata::from_metadata(&intent.metadata).map_err(PaymentError::MissingMetadata)?;
    let owner_user_id = state
        .directory
        .owner_for(&metadata)
        .await?
        .ok_or(PaymentError::MissingMetadata(CLIENT_ID_KEY))?;

    let write = state
        .ledger
        .record_outcome(NewPaymentRecord {
            owner_user_id,
            client_id: metadata.client_id,
            amount: from_minor_units(intent.amount),
            payment_date: Utc::now(),
            external_reference: intent.id.clone(),
            status: PaymentStatus::Succeeded,
            notes: Some(NewPaymentRecord::note_for(&intent.id)),
        })
        .await?;

    state
        .metrics
        .ledger_writes_total
        .with_label_values(&["confirmation", write.label()])
        .inc();

    match &write {
        LedgerWrite::Rejected { record, requested } => tracing::warn!(
            payment_intent_id = %intent.id,
            current = %record.status,
            requested = %requested,
            "confirmation did not change a settled payment record"
        ),
        other => tracing::info!(
            payment_intent_id = %intent.id,
            result = other.label(),
            "payment confirmed by client"
        ),
    }

    Ok(write)
}

/// Processor object ids are `[A-Za-z0-9_]+`
fn is_processor_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
