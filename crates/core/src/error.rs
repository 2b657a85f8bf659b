use crate::types::DbId;

/// Domain-level error type shared by the db and api layers.
///
/// `ConcurrentModification` is the only variant a caller is expected to
/// retry automatically; everything else is terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Illegal state transition: {from} -> {to}")]
    IllegalStateTransition { from: &'static str, to: &'static str },

    #[error("Track already has a passenger")]
    SeatTaken,

    #[error("Wrong role for this operation: {0}")]
    WrongRole(String),

    #[error("Passenger is already engaged on another track")]
    PassengerBusy,

    #[error("Caller is neither the driver nor the passenger of this track")]
    NotParticipant,

    #[error("Conflicting update committed first; retry the operation")]
    ConcurrentModification,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
