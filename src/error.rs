use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A validation message attached to one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Access forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields: {}", .0.iter().map(|f| f.field.as_str()).collect::<Vec<_>>().join(", "))]
    InvalidFields(Vec<FieldError>),

    #[error("Asset code allocation failed: {0}")]
    Allocation(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let (status, message, details) = match &self {
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database Error", None)
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "Validation Error", Some(msg.clone()))
            }
            AppError::InvalidFields(errs) => {
                fields = errs.clone();
                (StatusCode::BAD_REQUEST, "Validation Error", None)
            }
            AppError::Allocation(msg) => {
                tracing::error!("Asset code allocation failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Allocation Error", Some(msg.clone()))
            }
            AppError::Spreadsheet(msg) => {
                (StatusCode::BAD_REQUEST, "Spreadsheet Error", Some(msg.clone()))
            }
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            message: message.to_string(),
            details,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

/// Helper to convert anyhow errors to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
