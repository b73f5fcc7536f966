use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::processor::stripe::DEFAULT_API_BASE;
use crate::processor::StripeConfig;
use crate::state::PaymentSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Postgres,
    InMemory,
}

impl FromStr for StoreType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(StoreType::Postgres),
            "inmemory" => Ok(StoreType::InMemory),
            other => Err(ConfigError::Invalid {
                key: "STORE_TYPE",
                reason: format!("'{other}', must be 'postgres' or 'inmemory'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_type: StoreType,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    pub stripe: StripeConfig,
    pub jwt_secret: String,
    pub payments: PaymentSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &'static str, default: &str| {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let store_type: StoreType = or_default("STORE_TYPE", "postgres").parse()?;
        let database_url = match store_type {
            StoreType::Postgres => Some(required("DATABASE_URL")?),
            StoreType::InMemory => lookup("DATABASE_URL"),
        };

        let port = parse("PORT", &or_default("PORT", "8092"))?;

        let stripe = StripeConfig {
            secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            base_path: or_default("STRIPE_API_BASE", DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            webhook_tolerance_secs: parse(
                "WEBHOOK_TOLERANCE_SECS",
                &or_default("WEBHOOK_TOLERANCE_SECS", "300"),
            )?,
        };

        let platform_fee_fraction: Decimal = parse(
            "PLATFORM_FEE_FRACTION",
            &or_default("PLATFORM_FEE_FRACTION", "0.03"),
        )?;
        if platform_fee_fraction < Decimal::ZERO || platform_fee_fraction >= Decimal::ONE {
            return Err(ConfigError::Invalid {
                key: "PLATFORM_FEE_FRACTION",
                reason: format!("{platform_fee_fraction} is outside [0, 1)"),
            });
        }

        let payments = PaymentSettings {
            platform_fee_fraction,
            currency: or_default("PAYMENT_CURRENCY", "usd").to_lowercase(),
            public_base_url: or_default("PUBLIC_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            rate_limit_per_min: parse(
                "PAYMENT_RATE_LIMIT_PER_MIN",
                &or_default("PAYMENT_RATE_LIMIT_PER_MIN", "10"),
            )?,
        };

        Ok(Self {
            store_type,
            database_url,
            host: or_default("HOST", "0.0.0.0"),
            port,
            stripe,
            jwt_secret: required("JWT_SECRET")?,
            payments,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("STORE_TYPE", "inmemory"),
        ("STRIPE_SECRET_KEY", "sk_test_123"),
        ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
        ("JWT_SECRET", "jwt-secret"),
    ];

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup_from(BASE)).unwrap();
        assert_eq!(cfg.store_type, StoreType::InMemory);
        assert_eq!(cfg.port, 8092);
        assert_eq!(cfg.payments.platform_fee_fraction, Decimal::new(3, 2));
        assert_eq!(cfg.payments.currency, "usd");
        assert_eq!(cfg.stripe.base_path, DEFAULT_API_BASE);
        assert_eq!(cfg.stripe.webhook_tolerance_secs, 300);
    }

    #[test]
    fn postgres_requires_database_url() {
        let mut pairs = BASE.to_vec();
        pairs[0] = ("STORE_TYPE", "postgres");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn fee_fraction_must_be_a_fraction() {
        let mut pairs = BASE.to_vec();
        pairs.push(("PLATFORM_FEE_FRACTION", "1.5"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "PLATFORM_FEE_FRACTION",
                ..
            }
        ));
    }

    #[test]
    fn missing_webhook_secret_is_reported() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "STRIPE_WEBHOOK_SECRET")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("STRIPE_WEBHOOK_SECRET")));
    }
}
