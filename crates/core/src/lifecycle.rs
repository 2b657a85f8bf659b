//! Track and participant lifecycle state machines.
//!
//! State ids match the 1-based seed order of the `track_states` and
//! `user_states` lookup tables in the migrations. Both machines are pure
//! functions: a transition is validated against the pre-mutation state
//! before any field is written, never as a side effect of assignment.
//! Persistence is the caller's responsibility.

/// Lifecycle of a track (a single ride offer).
pub mod track {
    use crate::error::CoreError;
    use crate::types::StateId;

    /// Initial state: the driver is waiting for a passenger to join.
    pub const WAITING_PASSENGER: StateId = 1;
    /// A passenger has claimed the seat; waiting for the driver to depart.
    pub const WAITING_DEPARTURE: StateId = 2;
    /// The ride is underway.
    pub const ACTIVE: StateId = 3;
    /// Terminal state.
    pub const FINISHED: StateId = 4;

    /// State names in seed order, as stored in the `track_states` table.
    pub const STATE_NAMES: &[&str] = &[
        "WAITING_PASSENGER",
        "WAITING_DEPARTURE",
        "ACTIVE",
        "FINISHED",
    ];

    /// Returns the set of valid target state ids reachable from `from`.
    ///
    /// The time-based expiry sweep is NOT represented here: force-finishing
    /// an overdue track deliberately bypasses this table.
    pub fn valid_transitions(from: StateId) -> &'static [StateId] {
        match from {
            // WaitingPassenger -> WaitingDeparture (passenger joins)
            WAITING_PASSENGER => &[WAITING_DEPARTURE],
            // WaitingDeparture -> WaitingPassenger (passenger leaves),
            //                  -> Active (driver departs)
            WAITING_DEPARTURE => &[WAITING_PASSENGER, ACTIVE],
            // Active -> Finished
            ACTIVE => &[FINISHED],
            // Finished is terminal
            FINISHED => &[],
            // Unknown state: no transitions allowed
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: StateId, to: StateId) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition against the pre-mutation state.
    pub fn validate_transition(from: StateId, to: StateId) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::IllegalStateTransition {
                from: state_name(from),
                to: state_name(to),
            })
        }
    }

    /// Whether a track in this state can be deleted by its driver.
    pub fn can_remove(from: StateId) -> bool {
        from == WAITING_PASSENGER || from == WAITING_DEPARTURE
    }

    /// Whether this state is terminal.
    pub fn is_terminal(state: StateId) -> bool {
        state == FINISHED
    }

    /// Human-readable name for a state id.
    pub fn state_name(id: StateId) -> &'static str {
        match id {
            WAITING_PASSENGER => "WAITING_PASSENGER",
            WAITING_DEPARTURE => "WAITING_DEPARTURE",
            ACTIVE => "ACTIVE",
            FINISHED => "FINISHED",
            _ => "UNKNOWN",
        }
    }
}

/// Lifecycle of a participant (the `state` field on a user record).
///
/// A participant's state reflects at most one track at a time; the trip
/// orchestrator is the only writer.
pub mod participant {
    use crate::error::CoreError;
    use crate::types::StateId;

    /// Not attached to any track.
    pub const FREE: StateId = 1;
    /// Attached to a track that has not departed yet.
    pub const ON_TRACK_WAITING: StateId = 2;
    /// Riding on an active track.
    pub const ON_TRACK: StateId = 3;

    /// State names in seed order, as stored in the `user_states` table.
    pub const STATE_NAMES: &[&str] = &["FREE", "ON_TRACK_WAITING", "ON_TRACK"];

    /// Returns the set of valid target state ids reachable from `from`.
    pub fn valid_transitions(from: StateId) -> &'static [StateId] {
        match from {
            // Free -> OnTrackWaiting (joins or creates a track)
            FREE => &[ON_TRACK_WAITING],
            // OnTrackWaiting -> OnTrack (track departs),
            //                -> Free (removed from track, or track removed)
            ON_TRACK_WAITING => &[ON_TRACK, FREE],
            // OnTrack -> Free (track finishes)
            ON_TRACK => &[FREE],
            // Unknown state: no transitions allowed
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: StateId, to: StateId) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition against the pre-mutation state.
    pub fn validate_transition(from: StateId, to: StateId) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::IllegalStateTransition {
                from: state_name(from),
                to: state_name(to),
            })
        }
    }

    /// Human-readable name for a state id.
    pub fn state_name(id: StateId) -> &'static str {
        match id {
            FREE => "FREE",
            ON_TRACK_WAITING => "ON_TRACK_WAITING",
            ON_TRACK => "ON_TRACK",
            _ => "UNKNOWN",
        }
    }

    /// Resolve a state name back to its id (e.g. for request payloads).
    pub fn state_id(name: &str) -> Option<StateId> {
        match name {
            "FREE" => Some(FREE),
            "ON_TRACK_WAITING" => Some(ON_TRACK_WAITING),
            "ON_TRACK" => Some(ON_TRACK),
            _ => None,
        }
    }
}
