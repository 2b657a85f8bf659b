//! User entity model and DTOs.

use ridepool_core::lifecycle;
use ridepool_core::types::{DbId, StateId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub phone_number: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub state_id: StateId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Build the safe external representation (no password hash, state
    /// resolved to its name).
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            phone_number: self.phone_number.clone(),
            username: self.username.clone(),
            role: self.role.clone(),
            state: lifecycle::participant::state_name(self.state_id),
            created_at: self.created_at,
        }
    }
}

/// Safe user representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub phone_number: String,
    pub username: String,
    pub role: String,
    /// Resolved state name (e.g. `"FREE"`, `"ON_TRACK"`).
    pub state: &'static str,
    pub created_at: Timestamp,
}

/// DTO for creating a new user. The password is hashed before it gets here.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub phone_number: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub role: Option<String>,
}
