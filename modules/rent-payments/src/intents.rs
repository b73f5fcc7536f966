//! Intent issuance: turns a tenant's rent obligation into a processor payment
//! intent routed to the property manager's payout account. Nothing is written
//! to the ledger here; the record appears once the payment settles.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::models::CreateIntentResponse;
use crate::money::{platform_fee_minor, to_minor_units};
use crate::processor::{CreateIntentParams, ProcessorError};
use crate::state::AppState;

pub async fn issue_intent(
    state: &AppState,
    payer_id: Uuid,
) -> Result<CreateIntentResponse, PaymentError> {
    let result = build_and_create(state, payer_id).await;

    let label = match &result {
        Ok(_) => "created",
        Err(e) if e.status_code().is_client_error() => "refused",
        Err(_) => "error",
    };
    state.metrics.intents_total.with_label_values(&[label]).inc();

    result
}

async fn build_and_create(
    state: &AppState,
    payer_id: Uuid,
) -> Result<CreateIntentResponse, PaymentError> {
    let client = state
        .directory
        .linked_client(payer_id)
        .await?
        .ok_or(PaymentError::NotLinked)?;

    let rent = client
        .rent_amount
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or(PaymentError::InvalidAmount)?;

    let payee = state
        .directory
        .payee(client.owner_user_id)
        .await?
        .ok_or(PaymentError::PayeeNotFound)?;

    let account_id = payee
        .payout_account_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(PaymentError::PayoutNotConfigured)?;

    let account = state.processor.retrieve_account(&account_id).await?;
    if !account.is_ready() {
        tracing::info!(
            payee_id = %payee.user_id,
            account_id = %account.id,
            charges_enabled = account.charges_enabled,
            payouts_enabled = account.payouts_enabled,
            "payout account not ready for charges"
        );
        return Err(PaymentError::PayoutIncomplete);
    }

    let settings = &state.settings;
    let amount_minor = to_minor_units(rent).ok_or(PaymentError::InvalidAmount)?;
    let fee_minor = platform_fee_minor(rent, settings.platform_fee_fraction)
        .ok_or(PaymentError::InvalidAmount)?;

    let params = CreateIntentParams {
        amount_minor,
        currency: settings.currency.clone(),
        application_fee_minor: fee_minor,
        destination_account: account.id,
        payer_id,
        client_id: client.id,
        payee_id: payee.user_id,
    };

    let intent = state.processor.create_intent(&params).await?;
    let client_secret = intent.client_secret.ok_or_else(|| {
        ProcessorError::ParseError(format!(
            "payment intent {} returned without a client secret",
            intent.id
        ))
    })?;

    tracing::info!(
        payment_intent_id = %intent.id,
        payer_id = %payer_id,
        client_id = %client.id,
        amount_minor,
        fee_minor,
        "payment intent created"
    );

    Ok(CreateIntentResponse {
        client_secret,
        payment_intent_id: intent.id,
    })
}
