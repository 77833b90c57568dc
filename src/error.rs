use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::AuthError;

#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    BadRequest(String),
}

impl From<AuthError> for AppError {
    fn from(inner: AuthError) -> Self {
        AppError::Auth(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Auth(e @ (AuthError::CredentialConflict | AuthError::InvalidCredentials)) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            AppError::Auth(AuthError::Persistence(e)) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Auth(AuthError::PasswordHash(e)) => {
                tracing::error!("Password hash error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password hashing error".to_string(),
                )
            }
            AppError::Auth(AuthError::Signing(e)) => {
                tracing::error!("JWT error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Token error".to_string())
            }
            AppError::Auth(AuthError::Task(e)) => {
                tracing::error!("Hashing task error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
