use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt;

/// One field that failed request validation, reported back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self { field: field.to_string(), message: message.to_string() }
    }
}

/// The primary error type for the application.
///
/// Consolidates all failures the HTTP layer can surface, with a JSON error
/// envelope rendered by the `IntoResponse` impl.
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors that are not expected to be handled by the client.
    Internal(anyhow::Error),
    /// Client errors due to invalid requests.
    BadRequest(String),
    /// A requested resource does not exist.
    NotFound(String),
    /// A dependency (store, database) is temporarily unavailable.
    ServiceUnavailable(String),
    /// Errors from database operations.
    Database(String),
    /// Invalid user input outside of structured body validation.
    InvalidInput(String),
    /// One or more request body fields failed validation.
    Validation(Vec<FieldError>),
    /// The snapshot file could not be read or parsed.
    Snapshot(String),
    /// Building an export buffer failed.
    Export(String),
    /// The email-delivery collaborator rejected or never received the send.
    Mail(String),
    /// A required piece of configuration is missing (e.g. email credentials).
    NotConfigured(String),
    /// Too many requests within the rate-limit window.
    RateLimited {
        retry_after_seconds: u64,
    },
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::Validation(fields) => {
                write!(f, "Validation failed for {} field(s)", fields.len())
            }
            AppError::Snapshot(msg) => write!(f, "Snapshot error: {}", msg),
            AppError::Export(msg) => write!(f, "Export error: {}", msg),
            AppError::Mail(msg) => write!(f, "Mail delivery error: {}", msg),
            AppError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            AppError::RateLimited { retry_after_seconds } => {
                write!(f, "Rate limited. Retry after {} seconds", retry_after_seconds)
            }
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message, details) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                let error_id = uuid::Uuid::new_v4();
                tracing::error!("Error ID: {}", error_id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg, None)
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Some(json!({ "details": msg })),
                )
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(json!({ "fields": fields })),
            ),
            AppError::Snapshot(msg) => {
                tracing::error!("Snapshot error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "SNAPSHOT_ERROR", msg, None)
            }
            AppError::Export(msg) => {
                tracing::error!("Export error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "Export failed. Please try again.".to_string(),
                    Some(json!({ "details": msg })),
                )
            }
            AppError::Mail(msg) => {
                tracing::error!("Mail delivery error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MAIL_ERROR",
                    "Export failed. Please try again.".to_string(),
                    None,
                )
            }
            AppError::NotConfigured(msg) => {
                tracing::error!("Missing configuration: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", msg, None)
            }
            AppError::RateLimited { retry_after_seconds } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Too many requests. Please retry after {} seconds", retry_after_seconds),
                Some(json!({ "retry_after_seconds": retry_after_seconds })),
            ),
            AppError::IoError(msg) => {
                tracing::error!("I/O error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "An I/O error occurred".to_string(),
                    Some(json!({ "details": msg })),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
            sqlx::Error::PoolTimedOut => {
                AppError::ServiceUnavailable("Database connection pool timed out".to_string())
            }
            _ => AppError::Database(format!("Database error: {}", err)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Mail(err.to_string())
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;
