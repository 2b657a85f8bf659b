//! Route definitions for tracks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tracks;
use crate::state::AppState;

/// Routes mounted at `/tracks`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// GET    /search                  -> proximity search
/// GET    /{id}                    -> get
/// DELETE /{id}                    -> remove
/// POST   /{id}/add_passenger      -> join as passenger
/// POST   /{id}/remove_passenger   -> leave the seat
/// POST   /{id}/depart             -> driver departs
/// POST   /{id}/finish             -> finish the ride
/// POST   /{id}/comment            -> set comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tracks::list).post(tracks::create))
        .route("/search", get(tracks::search))
        .route("/{id}", get(tracks::get).delete(tracks::remove))
        .route("/{id}/add_passenger", post(tracks::add_passenger))
        .route("/{id}/remove_passenger", post(tracks::remove_passenger))
        .route("/{id}/depart", post(tracks::depart))
        .route("/{id}/finish", post(tracks::finish))
        .route("/{id}/comment", post(tracks::comment))
}
