use auth_kit::JwtKeys;
use axum::extract::FromRef;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::directory::Directory;
use crate::ledger::PaymentLedger;
use crate::metrics::Metrics;
use crate::middleware::rate_limit::KeyedLimiters;
use crate::processor::PaymentProcessor;

/// Business settings of the payments core
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Share of each payment retained by the platform, in [0, 1)
    pub platform_fee_fraction: Decimal,
    pub currency: String,
    /// Base URL of the web app, used for onboarding redirects
    pub public_base_url: String,
    /// Intent/confirmation requests per user per minute
    pub rate_limit_per_min: u32,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            platform_fee_fraction: Decimal::new(3, 2),
            currency: "usd".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            rate_limit_per_min: 10,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn PaymentLedger>,
    pub directory: Arc<dyn Directory>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub settings: Arc<PaymentSettings>,
    pub jwt: Arc<JwtKeys>,
    pub metrics: Metrics,
    pub limiters: KeyedLimiters,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn PaymentLedger>,
        directory: Arc<dyn Directory>,
        processor: Arc<dyn PaymentProcessor>,
        settings: PaymentSettings,
        jwt: JwtKeys,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            ledger,
            directory,
            processor,
            settings: Arc::new(settings),
            jwt: Arc::new(jwt),
            metrics: Metrics::new()?,
            limiters: KeyedLimiters::new(),
        })
    }
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
