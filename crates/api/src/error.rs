//! HTTP-facing error type and its JSON rendering.
//!
//! Every failure leaves the API as `{ "error": <message>, "code": <CODE> }`.
//! The code string is machine-readable; `CONCURRENT_MODIFICATION` is the
//! only one a client is expected to retry on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ridepool_core::error::CoreError;
use ridepool_db::error::TripError;
use serde_json::json;

/// Error type returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<TripError> for AppError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::Core(core) => AppError::Core(core),
            TripError::Database(db) => AppError::Database(db),
        }
    }
}

/// Map a domain error onto a status, code, and user-facing message.
///
/// Authorization failures are 401/403; state-machine and precondition
/// failures are all 409, distinguished by code, because the request was
/// well-formed but the world disagreed with it.
fn render_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::WrongRole(msg) => (StatusCode::FORBIDDEN, "WRONG_ROLE", msg.clone()),
        CoreError::NotParticipant => {
            (StatusCode::FORBIDDEN, "NOT_PARTICIPANT", core.to_string())
        }
        CoreError::PreconditionFailed(msg) => {
            (StatusCode::CONFLICT, "PRECONDITION_FAILED", msg.clone())
        }
        CoreError::IllegalStateTransition { .. } => (
            StatusCode::CONFLICT,
            "ILLEGAL_STATE_TRANSITION",
            core.to_string(),
        ),
        CoreError::SeatTaken => (StatusCode::CONFLICT, "SEAT_TAKEN", core.to_string()),
        CoreError::PassengerBusy => (StatusCode::CONFLICT, "PASSENGER_BUSY", core.to_string()),
        CoreError::ConcurrentModification => (
            StatusCode::CONFLICT,
            "CONCURRENT_MODIFICATION",
            core.to_string(),
        ),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map a sqlx error. Unique violations on our `uq_`-named constraints and
/// foreign-key violations become 409s; anything else is a sanitized 500.
fn render_sqlx(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    )
                } else {
                    tracing::error!(error = %db_err, "Database error");
                    internal()
                }
            }
            Some("23503") => (
                StatusCode::CONFLICT,
                "CONFLICT",
                "Resource is still referenced by other records".to_string(),
            ),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                internal()
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => render_core(core),
            AppError::Database(err) => render_sqlx(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}
