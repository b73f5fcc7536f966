pub mod error;
pub mod stripe;
pub mod types;
pub mod webhook;

pub use error::ProcessorError;
pub use stripe::{StripeClient, StripeConfig};
pub use types::{
    AccountLink, CreateIntentParams, IntentMetadata, Metadata, PaymentIntent, PayoutAccount,
};

use async_trait::async_trait;

/// Card-payment processor operations the payments core depends on.
///
/// [`StripeClient`] is the production implementation; tests substitute an
/// in-process fake.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Capability flags of a connected payout account
    async fn retrieve_account(&self, account_id: &str) -> Result<PayoutAccount, ProcessorError>;

    /// Create a payment intent that transfers to the payee's payout account
    async fn create_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, ProcessorError>;

    /// Current processor-side state of an intent
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError>;

    /// Hosted onboarding link for a payout account
    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, ProcessorError>;

    /// Check the signature header of an inbound webhook against the raw body
    fn verify_webhook_signature(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<(), ProcessorError>;
}
