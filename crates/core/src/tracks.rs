//! Validation rules for track creation and editing.

use crate::types::Timestamp;

/// Maximum length of a driver or passenger comment, in characters.
pub const MAX_COMMENT_LEN: usize = 1000;

/// How far into the future a departure may be scheduled.
pub const MAX_DEPARTURE_HORIZON_HOURS: i64 = 48;

/// Validate that a departure time is strictly in the future and within the
/// scheduling horizon, both evaluated against `now`.
pub fn validate_departure_time(departure: Timestamp, now: Timestamp) -> Result<(), String> {
    if departure <= now {
        return Err("departure_time must be in the future".to_string());
    }
    let horizon = now + chrono::Duration::hours(MAX_DEPARTURE_HORIZON_HOURS);
    if departure > horizon {
        return Err(format!(
            "departure_time must be within {MAX_DEPARTURE_HORIZON_HOURS} hours from now"
        ));
    }
    Ok(())
}

/// Validate a driver or passenger comment.
pub fn validate_comment(text: &str) -> Result<(), String> {
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        ));
    }
    Ok(())
}

/// Validate the seat count on a track. The matching model is single-passenger;
/// the value is informational but must still be a positive integer.
pub fn validate_max_seats(max_seats: i32) -> Result<(), String> {
    if max_seats < 1 {
        return Err("max_seats must be a positive integer".to_string());
    }
    Ok(())
}
