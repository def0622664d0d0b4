use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum DBError {
    #[error("A user with that username already exists.")]
    UsernameTaken,

    #[error("{0} not found")]
    NotFound(&'static str),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Any error: {0:?}")]
    Anyhow(#[from] anyhow::Error),

    #[error("DB Error: {0}")]
    DBError(#[from] DBError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("SQL failed: {0:?}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JWT error: {0:?}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Malformed body: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Malformed path: {0}")]
    PathRejection(#[from] PathRejection),

    #[error("Malformed query: {0}")]
    QueryRejection(#[from] QueryRejection),
}

/// Flattens validator output into `{ field: [message, ..] }`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<&'static str, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field, messages)
        })
        .collect()
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": field_messages(errors) }),
            ),
            AppError::DBError(DBError::UsernameTaken) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": { "username": [DBError::UsernameTaken.to_string()] } }),
            ),
            AppError::DBError(db_error @ DBError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, json!({ "error": db_error.to_string() }))
            }
            AppError::JsonRejection(rejection) => {
                (rejection.status(), json!({ "error": rejection.body_text() }))
            }
            AppError::PathRejection(rejection) => {
                (rejection.status(), json!({ "error": rejection.body_text() }))
            }
            AppError::QueryRejection(rejection) => {
                (rejection.status(), json!({ "error": rejection.body_text() }))
            }
            AppError::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, json!({ "error": message })),
            AppError::Unauthorized | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication credentials were not provided or are invalid." }),
            ),
            AppError::Sqlx(_) | AppError::Anyhow(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
