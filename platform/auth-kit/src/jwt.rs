use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tenant,
    Manager,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tenant => f.write_str("tenant"),
            Role::Manager => f.write_str("manager"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user_id
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token subject is not a user id")]
    InvalidSubject,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn sign_access_token(
        &self,
        user_id: Uuid,
        role: Role,
        ttl_minutes: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(ttl_minutes);
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_round_trips_subject_and_role() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let user = Uuid::new_v4();
        let token = keys.sign_access_token(user, Role::Tenant, 5).unwrap();

        let claims = keys.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user.to_string());
        assert_eq!(claims.role, Role::Tenant);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let signer = JwtKeys::from_secret(b"secret-a");
        let verifier = JwtKeys::from_secret(b"secret-b");
        let token = signer
            .sign_access_token(Uuid::new_v4(), Role::Manager, 5)
            .unwrap();

        assert!(matches!(
            verifier.validate_access_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        // well past the default 60s leeway
        let token = keys
            .sign_access_token(Uuid::new_v4(), Role::Tenant, -10)
            .unwrap();

        assert!(keys.validate_access_token(&token).is_err());
    }
}
