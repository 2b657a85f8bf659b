//! Handlers for the `/tracks` resource: the trip lifecycle endpoints and
//! the proximity search.
//!
//! All lifecycle mutations delegate to the trip orchestrator
//! (`TripRepo`), which owns the preconditions and transactional writes;
//! these handlers only translate between HTTP and the orchestrator.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ridepool_core::error::CoreError;
use ridepool_core::proximity::{self, GeoPoint, PageRequest, RankedPage, Route};
use ridepool_core::types::DbId;
use ridepool_db::models::track::{CreateTrack, TrackResponse};
use ridepool_db::repositories::{TrackRepo, TripRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{PaginationParams, TrackSearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default search page size when `ipp` is absent.
const DEFAULT_SEARCH_IPP: u32 = 20;

/// Maximum search page size.
const MAX_SEARCH_IPP: u32 = 100;

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

/// POST /api/v1/tracks
///
/// Create a new track offer. The caller becomes the driver. Returns 201.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTrack>,
) -> AppResult<impl IntoResponse> {
    let track = TripRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        track_id = track.id,
        driver_id = auth.user_id,
        departure_time = %track.departure_time,
        "Track created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: track.to_response(),
        }),
    ))
}

/// GET /api/v1/tracks/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TrackRepo::find_by_id(&state.pool, track_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Track",
            id: track_id,
        }))?;
    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// GET /api/v1/tracks
///
/// List tracks, newest first. Supports `limit` and `offset`.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<TrackResponse>>>> {
    let tracks = TrackRepo::list(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse {
        data: tracks.iter().map(|t| t.to_response()).collect(),
    }))
}

// ---------------------------------------------------------------------------
// Proximity search
// ---------------------------------------------------------------------------

/// GET /api/v1/tracks/search
///
/// Rank every track waiting for a passenger by proximity to the rider's
/// start and end points, and return one page. Coordinates must be finite.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<TrackSearchParams>,
) -> AppResult<Json<DataResponse<RankedPage<TrackResponse>>>> {
    for value in [params.s_x, params.s_y, params.e_x, params.e_y] {
        if !value.is_finite() {
            return Err(AppError::Core(CoreError::Validation(
                "Coordinates must be finite numbers".into(),
            )));
        }
    }

    let query = Route {
        start: GeoPoint {
            x: params.s_x,
            y: params.s_y,
        },
        end: GeoPoint {
            x: params.e_x,
            y: params.e_y,
        },
    };
    let page = PageRequest {
        page: params.page.unwrap_or(0),
        per_page: params.ipp.unwrap_or(DEFAULT_SEARCH_IPP).min(MAX_SEARCH_IPP),
    };

    let candidates = TrackRepo::list_waiting(&state.pool).await?;
    let ranked = proximity::rank(candidates, query, page, |t| t.route());

    Ok(Json(DataResponse {
        data: RankedPage {
            items: ranked.items.iter().map(|t| t.to_response()).collect(),
            total: ranked.total,
            is_more: ranked.is_more,
        },
    }))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/tracks/{id}/add_passenger
///
/// The caller takes the passenger seat.
pub async fn add_passenger(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TripRepo::add_passenger(&state.pool, track_id, auth.user_id).await?;

    tracing::info!(track_id, passenger_id = auth.user_id, "Passenger joined track");

    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// POST /api/v1/tracks/{id}/remove_passenger
///
/// The caller (the current passenger) leaves the seat.
pub async fn remove_passenger(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TripRepo::remove_passenger(&state.pool, track_id, auth.user_id).await?;

    tracing::info!(track_id, passenger_id = auth.user_id, "Passenger left track");

    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// POST /api/v1/tracks/{id}/depart
pub async fn depart(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TripRepo::depart(&state.pool, track_id, auth.user_id).await?;

    tracing::info!(track_id, driver_id = auth.user_id, "Track departed");

    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// POST /api/v1/tracks/{id}/finish
pub async fn finish(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TripRepo::finish(&state.pool, track_id, auth.user_id).await?;

    tracing::info!(track_id, caller_id = auth.user_id, "Track finished");

    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// Request body for `POST /tracks/{id}/comment`.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

/// POST /api/v1/tracks/{id}/comment
///
/// Set the driver or passenger comment, depending on who the caller is.
pub async fn comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
    Json(input): Json<CommentRequest>,
) -> AppResult<Json<DataResponse<TrackResponse>>> {
    let track = TripRepo::comment(&state.pool, track_id, auth.user_id, &input.comment).await?;
    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}

/// DELETE /api/v1/tracks/{id}
///
/// Remove a track that has not departed. Returns 204.
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    TripRepo::remove(&state.pool, track_id, auth.user_id).await?;

    tracing::info!(track_id, driver_id = auth.user_id, "Track removed");

    Ok(StatusCode::NO_CONTENT)
}
