//! Track entity model and DTOs.
//!
//! A track is a single ride offer: one driver, at most one passenger, a
//! start/end point pair, and a lifecycle state. The driver reference is set
//! at creation and never changes; the passenger reference is set and
//! cleared by the trip orchestrator only.

use ridepool_core::lifecycle;
use ridepool_core::proximity::{GeoPoint, Route};
use ridepool_core::types::{DbId, StateId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tracks` table.
#[derive(Debug, Clone, FromRow)]
pub struct Track {
    pub id: DbId,
    pub driver_id: DbId,
    pub passenger_id: Option<DbId>,
    pub start_x: f64,
    pub start_y: f64,
    pub start_address: Option<String>,
    pub end_x: f64,
    pub end_y: f64,
    pub end_address: Option<String>,
    pub state_id: StateId,
    pub max_seats: i32,
    pub driver_comment: String,
    pub passenger_comment: String,
    pub departure_time: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Track {
    /// The track's start/end pair as a proximity route.
    pub fn route(&self) -> Route {
        Route {
            start: GeoPoint {
                x: self.start_x,
                y: self.start_y,
            },
            end: GeoPoint {
                x: self.end_x,
                y: self.end_y,
            },
        }
    }

    /// Whether `user_id` is the track's driver.
    pub fn is_driver(&self, user_id: DbId) -> bool {
        self.driver_id == user_id
    }

    /// Whether `user_id` is the track's current passenger.
    pub fn is_passenger(&self, user_id: DbId) -> bool {
        self.passenger_id == Some(user_id)
    }

    /// Build the external representation (state resolved to its name).
    pub fn to_response(&self) -> TrackResponse {
        TrackResponse {
            id: self.id,
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            start_x: self.start_x,
            start_y: self.start_y,
            start_address: self.start_address.clone(),
            end_x: self.end_x,
            end_y: self.end_y,
            end_address: self.end_address.clone(),
            state: lifecycle::track::state_name(self.state_id),
            max_seats: self.max_seats,
            driver_comment: self.driver_comment.clone(),
            passenger_comment: self.passenger_comment.clone(),
            departure_time: self.departure_time,
            created_at: self.created_at,
        }
    }
}

/// External track representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct TrackResponse {
    pub id: DbId,
    pub driver_id: DbId,
    pub passenger_id: Option<DbId>,
    pub start_x: f64,
    pub start_y: f64,
    pub start_address: Option<String>,
    pub end_x: f64,
    pub end_y: f64,
    pub end_address: Option<String>,
    /// Resolved state name (e.g. `"WAITING_PASSENGER"`).
    pub state: &'static str,
    pub max_seats: i32,
    pub driver_comment: String,
    pub passenger_comment: String,
    pub departure_time: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for creating a new track. The driver comes from the caller identity,
/// the state always starts at WAITING_PASSENGER.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrack {
    pub start_x: f64,
    pub start_y: f64,
    pub start_address: Option<String>,
    pub end_x: f64,
    pub end_y: f64,
    pub end_address: Option<String>,
    pub max_seats: i32,
    pub driver_comment: Option<String>,
    pub departure_time: Timestamp,
}
