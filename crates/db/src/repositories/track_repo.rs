//! Read-side repository for the `tracks` table.
//!
//! All lifecycle mutations go through
//! [`TripRepo`](crate::repositories::trip_repo::TripRepo); this repository
//! only serves lookups and listings.

use ridepool_core::types::DbId;
use sqlx::PgPool;

use crate::models::state::TrackState;
use crate::models::track::Track;

/// Every `tracks` column, in the order the model expects. Shared with the
/// trip orchestrator's RETURNING clauses.
pub(crate) const COLUMNS: &str = "\
    id, driver_id, passenger_id, \
    start_x, start_y, start_address, end_x, end_y, end_address, \
    state_id, max_seats, driver_comment, passenger_comment, \
    departure_time, created_at, updated_at";

/// Maximum page size for track listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for track listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides read operations for tracks.
pub struct TrackRepo;

impl TrackRepo {
    /// Find a track by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Track>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE id = $1");
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tracks in descending order of creation, with pagination.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Track>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find the non-finished track a user participates in (as driver or
    /// passenger), if any. A participant is on at most one such track.
    pub async fn find_active_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             WHERE (driver_id = $1 OR passenger_id = $1) AND state_id <> $2"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(user_id)
            .bind(TrackState::Finished.id())
            .fetch_optional(pool)
            .await
    }

    /// List every track waiting for a passenger, in creation order.
    ///
    /// Candidates for the proximity ranking; creation order makes ranking
    /// ties deterministic. This is a full scan by design -- see
    /// `ridepool_core::proximity`.
    pub async fn list_waiting(pool: &PgPool) -> Result<Vec<Track>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             WHERE state_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(TrackState::WaitingPassenger.id())
            .fetch_all(pool)
            .await
    }
}
