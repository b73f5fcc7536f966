use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::error::ProcessorError;
use super::types::{AccountLink, CreateIntentParams, PaymentIntent, PayoutAccount};
use super::webhook::verify_webhook_signature;
use super::PaymentProcessor;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Configuration for the Stripe API client
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub base_path: String,
    pub webhook_tolerance_secs: i64,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            base_path: DEFAULT_API_BASE.to_string(),
            webhook_tolerance_secs: 300,
        }
    }
}

/// Stripe REST client (form-encoded requests, JSON responses)
#[derive(Clone)]
pub struct StripeClient {
    config: Arc<StripeConfig>,
    http_client: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, ProcessorError> {
        if config.secret_key.trim().is_empty() {
            return Err(ProcessorError::ConfigError(
                "Missing STRIPE_SECRET_KEY".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProcessorError::HttpError(e.to_string()))?;

        Ok(StripeClient {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Make a GET request to the Stripe API
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        let url = format!("{}{}", self.config.base_path, path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| ProcessorError::HttpError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make a form-encoded POST request to the Stripe API
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(String, String)],
    ) -> Result<T, ProcessorError> {
        let url = format!("{}{}", self.config.base_path, path);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(fields)
            .send()
            .await
            .map_err(|e| ProcessorError::HttpError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle HTTP response and convert to appropriate type or error
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProcessorError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ProcessorError::ParseError(e.to_string()))
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            Err(ProcessorError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            })
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn retrieve_account(&self, account_id: &str) -> Result<PayoutAccount, ProcessorError> {
        self.get(&format!("/v1/accounts/{}", account_id)).await
    }

    async fn create_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, ProcessorError> {
        self.post_form("/v1/payment_intents", &params.form_fields())
            .await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        self.get(&format!("/v1/payment_intents/{}", intent_id)).await
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, ProcessorError> {
        let fields = [
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];
        self.post_form("/v1/account_links", &fields).await
    }

    fn verify_webhook_signature(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<(), ProcessorError> {
        verify_webhook_signature(
            raw_body,
            signature_header,
            &self.config.webhook_secret,
            Some(self.config.webhook_tolerance_secs),
        )
    }
}
