//! Caller identity extraction from the `Authorization` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ridepool_core::error::CoreError;
use ridepool_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, taken from a verified bearer token.
///
/// Handlers opt into authentication by adding an `AuthUser` parameter; a
/// request without a valid token is rejected with 401 before the handler
/// body runs. The id and role come from the token claims, not the database,
/// so a role change takes effect on the next login.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Role name, e.g. `"ROLE_DRIVER"`.
    pub role: String,
}

fn unauthorized(reason: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(reason.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Expected a bearer token"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
