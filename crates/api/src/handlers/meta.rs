//! Enumeration discovery endpoint for clients.

use axum::Json;
use ridepool_core::lifecycle::{participant, track};
use ridepool_core::roles::VALID_ROLES;
use serde::Serialize;

/// Response payload for `GET /enums`.
#[derive(Debug, Serialize)]
pub struct EnumsResponse {
    pub user_roles: &'static [&'static str],
    pub user_states: &'static [&'static str],
    pub track_states: &'static [&'static str],
}

/// GET /api/v1/enums -- the closed value sets clients may encounter.
pub async fn enums() -> Json<EnumsResponse> {
    Json(EnumsResponse {
        user_roles: VALID_ROLES,
        user_states: participant::STATE_NAMES,
        track_states: track::STATE_NAMES,
    })
}
