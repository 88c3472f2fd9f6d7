use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors that reach the HTTP boundary.
///
/// Probe failures never show up here: the prober turns them into a
/// `Verdict::Down` sample instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Unhandled database error: {:?}", e);
                "Internal Server Error".to_owned()
            }
            AppError::Internal(e) => {
                tracing::error!("Unhandled error: {:?}", e);
                "Internal Server Error".to_owned()
            }
            other => other.to_string(),
        };

        let body = json!({
            "statusCode": status.as_u16(),
            "success": false,
            "message": message,
            "errors": [],
            "data": null,
        });

        (status, Json(body)).into_response()
    }
}

/// True when `err` is SQLite rejecting a duplicate value on a UNIQUE column.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// True when `err` is SQLite rejecting a row whose foreign key points nowhere.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}
