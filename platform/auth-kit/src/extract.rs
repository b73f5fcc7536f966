use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::jwt::{AuthError, JwtKeys, Role};

/// Caller identity resolved from a validated bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Reject callers that do not hold `role`.
    pub fn require(self, role: Role) -> Result<Self, AuthRejection> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AuthRejection::WrongRole { required: role })
        }
    }
}

#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    Invalid(AuthError),
    WrongRole { required: Role },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthRejection::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing bearer token".to_string(),
            ),
            AuthRejection::Invalid(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                (
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Invalid or expired token".to_string(),
                )
            }
            AuthRejection::WrongRole { required } => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("This action requires the {required} role"),
            ),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection::MissingToken)?;

        let keys = Arc::<JwtKeys>::from_ref(state);
        let claims = keys
            .validate_access_token(token)
            .map_err(AuthRejection::Invalid)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthRejection::Invalid(AuthError::InvalidSubject))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }
}
