use ridepool_core::error::CoreError;

/// Error type for trip orchestrator operations.
///
/// Repositories that only touch a single table return `sqlx::Error`
/// directly; the orchestrator layers domain failures on top.
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    /// A domain-level failure (precondition, state machine, participation).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
