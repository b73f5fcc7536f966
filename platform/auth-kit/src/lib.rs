//! # auth-kit
//!
//! Bearer-token plumbing shared by the payment services.
//!
//! - [`JwtKeys`] signs and validates HS256 access tokens
//! - [`AuthUser`] is an axum extractor that resolves the caller from the
//!   `Authorization: Bearer …` header
//! - [`Role`] separates tenants (who pay rent) from property managers (who
//!   own the ledger)
//!
//! The extractor only needs `Arc<JwtKeys>` to be reachable from the router
//! state through [`axum::extract::FromRef`].

mod extract;
mod jwt;

pub use extract::{AuthRejection, AuthUser};
pub use jwt::{AccessClaims, AuthError, JwtKeys, Role};
