//! Well-known role name constants.
//!
//! These must match the seed values accepted by the `users.role` column
//! check constraint in the migrations.

/// A user who offers rides and owns the tracks they create.
pub const ROLE_DRIVER: &str = "ROLE_DRIVER";

/// A user who joins an offered ride as the single passenger.
pub const ROLE_PASSENGER: &str = "ROLE_PASSENGER";

/// Operational role with unrestricted read access.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// All accepted role values.
pub const VALID_ROLES: &[&str] = &[ROLE_PASSENGER, ROLE_DRIVER, ROLE_ADMIN];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}
