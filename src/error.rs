use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::db::StoreError;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    DuplicateEmail,
    AlreadyExists(String),
    InvalidCredentials,
    Unauthenticated,
    InvalidToken,
    NotFound(String),
    PayloadTooLarge,
    Internal(String),
    Store(StoreError),
}

impl AppError {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Store(_) => "STORE_FAILURE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateEmail | AppError::AlreadyExists(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {msg}"),
            AppError::DuplicateEmail => write!(f, "Duplicate Email"),
            AppError::AlreadyExists(msg) => write!(f, "Already Exists: {msg}"),
            AppError::InvalidCredentials => write!(f, "Invalid Credentials"),
            AppError::Unauthenticated => write!(f, "Unauthenticated"),
            AppError::InvalidToken => write!(f, "Invalid Token"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::PayloadTooLarge => write!(f, "Payload Too Large"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Store(err) => write!(f, "Store Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) | AppError::AlreadyExists(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::DuplicateEmail => "Email is already registered".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Unauthenticated => "Access denied, no token provided".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::PayloadTooLarge => "Request body is too large".to_string(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                "Internal server error".to_string()
            }
        };

        let body = json!({ "code": self.code(), "error": message });
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) => AppError::Internal(format!("Token encoding failed: {msg}")),
            TokenError::MissingHeader => AppError::Unauthenticated,
            _ => AppError::InvalidToken,
        }
    }
}
