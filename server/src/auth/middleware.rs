use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::auth::{cookie, jwt};
use crate::error::{ApiError, AuthError};

/// Session token claims.
/// Implements axum's FromRequestParts for use as an extractor: the token is
/// read from `Authorization: Bearer` or, failing that, the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id (users.id)
    pub sub: String,
    /// "user" or "admin"
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let keys = parts
            .extensions
            .get::<SessionKeys>()
            .ok_or_else(|| ApiError::Internal("session keys missing".to_string()))?;

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());

        let token = cookie::credential_from(bearer, cookies, &keys.cookie_name)
            .ok_or(AuthError::AuthenticationRequired)?;

        jwt::validate_session_token(&keys.secret, token)
            .map_err(|_| ApiError::from(AuthError::AuthenticationInvalid))
    }
}

/// Verification material stored in request extensions for the Claims extractor
#[derive(Clone)]
pub struct SessionKeys {
    pub secret: Vec<u8>,
    pub cookie_name: String,
}
