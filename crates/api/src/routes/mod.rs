pub mod auth;
pub mod health;
pub mod tracks;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /enums                             role/state value sets (public)
///
/// /auth/login                        login (public)
///
/// /users                             list (public), register (public)
/// /users/{id}                        get, update, delete
/// /users/{id}/set_state              manual state override
/// /users/{id}/car                    get, update
/// /users/{id}/track                  the user's active track
///
/// /tracks                            list (public), create
/// /tracks/search                     proximity search (public)
/// /tracks/{id}                       get (public), delete
/// /tracks/{id}/add_passenger         join as passenger
/// /tracks/{id}/remove_passenger      leave the seat
/// /tracks/{id}/depart                driver departs
/// /tracks/{id}/finish                finish the ride
/// /tracks/{id}/comment               set driver/passenger comment
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/enums", get(handlers::meta::enums))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/tracks", tracks::router())
}
