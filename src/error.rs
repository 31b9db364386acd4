use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Field name -> human readable messages, as returned to form clients.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0:?}")]
    InvalidFields(FieldErrors),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("External service error: {0}")]
    External(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::InvalidFields(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Payment(_) | AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                json!({ "error": "Database error occurred" })
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": "Internal server error" })
            }
            AppError::Payment(ref msg) => {
                tracing::error!("Payment provider error: {}", msg);
                json!({ "error": msg })
            }
            AppError::External(ref msg) => {
                tracing::error!("External service error: {}", msg);
                json!({ "error": msg })
            }
            AppError::InvalidFields(ref errors) => json!({
                "error": "Validation failed",
                "errors": errors,
            }),
            AppError::Forbidden => json!({ "error": "Forbidden" }),
            AppError::NotFound(ref msg)
            | AppError::Unauthorized(ref msg)
            | AppError::BadRequest(ref msg)
            | AppError::Conflict(ref msg)
            | AppError::ServiceUnavailable(ref msg) => json!({ "error": msg }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in err.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                })
                .collect();
            errors.insert(camel_case(&field), messages);
        }
        AppError::InvalidFields(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON that does not fit the request type.
            JsonRejection::JsonDataError(e) => AppError::field("body", e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Request bodies are camelCase; validator reports Rust field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether a database error came from a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains("UNIQUE"),
        _ => false,
    }
}
