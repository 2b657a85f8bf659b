//! Car entity model and DTOs.
//!
//! Each user owns at most one car (unique `user_id`); a driver must have
//! one before they may create a track.

use ridepool_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cars` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Car {
    pub id: DbId,
    pub user_id: DbId,
    pub model: String,
    pub color: String,
    pub reg_number: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or replacing a user's car.
#[derive(Debug, Deserialize)]
pub struct UpsertCar {
    pub model: String,
    pub color: String,
    pub reg_number: String,
}
