use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// WebSocket close codes sent when a handshake is rejected.
pub const CLOSE_AUTH_REQUIRED: u16 = 4001;
pub const CLOSE_AUTH_INVALID: u16 = 4002;

/// Why a credential did not resolve to an identity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Authentication invalid")]
    AuthenticationInvalid,
}

impl AuthError {
    pub fn close_code(&self) -> u16 {
        match self {
            AuthError::AuthenticationRequired => CLOSE_AUTH_REQUIRED,
            AuthError::AuthenticationInvalid => CLOSE_AUTH_INVALID,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
