//! Error types for the HTTP API.
//!
//! ```text
//! CoreError / DbError / AuthError / JSON rejection
//!        │
//!        ▼
//!    ApiError ──► (status, {"code", "message", "fields"?})
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use bazaar_core::{CoreError, FieldError};
use bazaar_db::DbError;

use crate::auth::AuthError;
use crate::engine::EngineError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidArgument {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Authentication invalid: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized to access this route: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InsufficientInventory(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment initiation failed: {0}")]
    PaymentFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientInventory(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PaymentFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InsufficientInventory(_) => "INSUFFICIENT_INVENTORY",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PaymentFailed(_) => "PAYMENT_INITIATION_FAILED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidArgument { message, fields } => {
                ApiError::InvalidArgument { message, fields }
            }
            e @ CoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CoreError::InsufficientInventory {
                available,
                requested,
                ..
            } => ApiError::InsufficientInventory(format!(
                "Only {available} items available in stock, {requested} requested"
            )),
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::PaymentInitiationFailed(msg) => ApiError::PaymentFailed(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        ApiError::from(EngineError::from(error))
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Core(e) => e.into(),
            EngineError::Db(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Unauthenticated(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument {
            message: rejection.body_text(),
            fields: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Don't expose internal error details to clients
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Something went wrong, try again later".to_string()
            }
            other => other.to_string(),
        };

        let fields = match &self {
            ApiError::InvalidArgument { fields, .. } => fields.clone(),
            _ => Vec::new(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
            fields,
        };

        (self.status(), Json(body)).into_response()
    }
}
