//! JWT authentication module.
//!
//! Turns an `Authorization: Bearer <token>` header into a [`Caller`].
//! Credentials are issued elsewhere; this side only verifies them.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bazaar_core::{Caller, Role};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: String,

    /// `admin` or `customer`
    pub role: Role,

    /// Display name
    pub name: String,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Authentication failures. Always reported as 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingCredential,

    #[error("Token verification failed: {0}")]
    InvalidCredential(String),

    #[error("Failed to issue token: {0}")]
    Issue(String),
}

/// Verifies an opaque credential and names its bearer.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Caller, AuthError>;
}

/// HS256 JWT verifier.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        JwtVerifier {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a credential for `caller`, valid for `lifetime`.
    pub fn issue(&self, caller: &Caller, lifetime: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            id: caller.user_id.clone(),
            role: caller.role,
            name: caller.name.clone(),
            exp: (Utc::now() + lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<Caller, AuthError> {
        let token_data: TokenData<Claims> = decode(credential, &self.decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        let claims = token_data.claims;
        Ok(Caller::new(claims.id, claims.role, claims.name))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that requires an authenticated caller.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(caller): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", caller.name)
/// }
/// ```
pub struct RequireAuth(pub Caller);

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingCredential)?;

        let caller = state.verifier.verify(token)?;
        debug!(user_id = %caller.user_id, role = %caller.role, "Caller authenticated");

        Ok(RequireAuth(caller))
    }
}
