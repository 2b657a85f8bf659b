//! Route definitions for users.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> register
/// GET    /{id}             -> get
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete
/// POST   /{id}/set_state   -> manual state override
/// GET    /{id}/car         -> get car
/// PUT    /{id}/car         -> upsert car
/// GET    /{id}/track       -> active track
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::register))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/set_state", post(users::set_state))
        .route("/{id}/car", get(users::get_car).put(users::update_car))
        .route("/{id}/track", get(users::get_active_track))
}
