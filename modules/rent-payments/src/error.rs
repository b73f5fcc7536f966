use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::processor::ProcessorError;

/// Failures of the ledger or directory backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("cannot create a record in status {0}")]
    InvalidInitialStatus(crate::ledger::PaymentStatus),
}

/// Errors surfaced at the HTTP boundary of the payments core
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Your account is not linked to a client record")]
    NotLinked,

    #[error("Rent amount must be greater than zero")]
    InvalidAmount,

    #[error("Property manager not found")]
    PayeeNotFound,

    #[error("Your property manager has not set up online payments yet. Please contact your property manager.")]
    PayoutNotConfigured,

    #[error("Your property manager's payout account is not fully set up. Please contact your property manager.")]
    PayoutIncomplete,

    #[error("Payment has not been confirmed by the processor (status: {0})")]
    PaymentNotConfirmed(String),

    #[error("This payment does not belong to you")]
    OwnershipMismatch,

    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    #[error("Malformed webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Payment metadata is missing {0}")]
    MissingMetadata(&'static str),

    #[error("Too many payment requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::InvalidRequest(_)
            | PaymentError::InvalidAmount
            | PaymentError::PayoutNotConfigured
            | PaymentError::PayoutIncomplete
            | PaymentError::PaymentNotConfirmed(_)
            | PaymentError::SignatureInvalid
            | PaymentError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            PaymentError::NotLinked | PaymentError::OwnershipMismatch => StatusCode::FORBIDDEN,
            PaymentError::PayeeNotFound => StatusCode::NOT_FOUND,
            PaymentError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            PaymentError::MissingMetadata(_)
            | PaymentError::Processor(_)
            | PaymentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            PaymentError::InvalidRequest(_) => "invalid_request",
            PaymentError::NotLinked => "not_linked",
            PaymentError::InvalidAmount => "invalid_amount",
            PaymentError::PayeeNotFound => "payee_not_found",
            PaymentError::PayoutNotConfigured => "payout_not_configured",
            PaymentError::PayoutIncomplete => "payout_incomplete",
            PaymentError::PaymentNotConfirmed(_) => "payment_not_confirmed",
            PaymentError::OwnershipMismatch => "payment_ownership_mismatch",
            PaymentError::SignatureInvalid => "signature_invalid",
            PaymentError::InvalidPayload(_) => "invalid_payload",
            PaymentError::MissingMetadata(_) => "missing_metadata",
            PaymentError::RateLimited { .. } => "rate_limited",
            PaymentError::Processor(_) => "processor_error",
            PaymentError::Store(_) => "database_error",
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal detail stays in the log
        let message = match &self {
            PaymentError::Processor(e) => {
                tracing::error!(error = %e, "payment processor call failed");
                "Payment processor request failed".to_string()
            }
            PaymentError::Store(e) => {
                tracing::error!(error = %e, "payment ledger operation failed");
                "Failed to update payment records".to_string()
            }
            PaymentError::MissingMetadata(_) => {
                tracing::error!(error = %self, "payment intent carries incomplete metadata");
                "Payment could not be attributed".to_string()
            }
            other => {
                if status.is_client_error() {
                    tracing::warn!(error = %other, status = status.as_u16(), "payment request rejected");
                }
                other.to_string()
            }
        };

        (status, Json(ErrorResponse::new(self.code(), message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_map_to_client_statuses() {
        assert_eq!(PaymentError::NotLinked.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PaymentError::InvalidAmount.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PaymentError::PayeeNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PaymentError::OwnershipMismatch.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PaymentError::SignatureInvalid.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_failures_are_server_errors() {
        let err = PaymentError::from(ProcessorError::HttpError("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = PaymentError::from(StoreError::Corrupt("bad status".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
