use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AppError
///
/// The single failure type produced by the forum core. Every service returns it and
/// every handler hands it straight back to Axum, which renders it through `IntoResponse`.
/// No variant implies a partial write: a failing operation leaves the store untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// A referenced user, thread, message or vote does not exist.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// A role gate or ownership check said no.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// A uniqueness rule was violated (duplicate username, racing vote insert).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed or incomplete input rejected at the boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// Bad credentials on login.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (database down, hashing backend error).
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for forum logic.
pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// sqlx::Error conversion
///
/// Unique-constraint violations are the only database errors the core reacts to
/// (they surface as `Conflict`). Everything else is logged here and reported to the
/// client as an opaque internal error.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        if let sqlx::Error::RowNotFound = err {
            return AppError::not_found("Row", "unknown");
        }
        tracing::error!("database error: {:?}", err);
        AppError::Internal("database error".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the logs.
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
