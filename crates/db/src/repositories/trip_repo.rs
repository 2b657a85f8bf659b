//! The trip orchestrator: compound operations that mutate a track and its
//! linked participants together.
//!
//! Every operation runs inside a single transaction. Reads are plain; every
//! state-changing UPDATE is guarded by the state the operation observed
//! (`... AND state_id = $observed`). A guard miss means another operation
//! committed first: the transaction rolls back and the caller gets
//! `ConcurrentModification`, the only error kind worth an automatic retry.
//! No partial write ever commits.

use chrono::Utc;
use ridepool_core::error::CoreError;
use ridepool_core::lifecycle::{participant, track as track_lifecycle};
use ridepool_core::roles::{ROLE_DRIVER, ROLE_PASSENGER};
use ridepool_core::tracks::{validate_comment, validate_departure_time, validate_max_seats};
use ridepool_core::types::{DbId, StateId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::error::TripError;
use crate::models::track::{CreateTrack, Track};
use crate::models::user::User;
use crate::repositories::track_repo;

/// Column list for `users` loads inside orchestrator transactions.
const USER_COLUMNS: &str = "id, phone_number, username, password_hash, role, \
    state_id, created_at, updated_at";

/// Orchestrates the joint track/participant lifecycle.
pub struct TripRepo;

impl TripRepo {
    /// Create a new track in WAITING_PASSENGER and move the driver
    /// FREE -> ON_TRACK_WAITING.
    ///
    /// Preconditions: the caller has the driver role, is FREE, and owns a
    /// car; the departure time is in the future and within the scheduling
    /// horizon.
    pub async fn create(
        pool: &PgPool,
        driver_id: DbId,
        input: &CreateTrack,
    ) -> Result<Track, TripError> {
        validate_departure_time(input.departure_time, Utc::now())
            .map_err(CoreError::Validation)?;
        validate_max_seats(input.max_seats).map_err(CoreError::Validation)?;
        if let Some(comment) = &input.driver_comment {
            validate_comment(comment).map_err(CoreError::Validation)?;
        }

        let mut tx = pool.begin().await?;

        let driver = load_user(&mut *tx, driver_id).await?;
        if driver.role != ROLE_DRIVER {
            return Err(CoreError::PreconditionFailed("User is not a driver".into()).into());
        }
        if driver.state_id != participant::FREE {
            return Err(CoreError::PreconditionFailed(format!(
                "Driver is not free (state is {})",
                participant::state_name(driver.state_id)
            ))
            .into());
        }

        let has_car: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM cars WHERE user_id = $1)")
                .bind(driver_id)
                .fetch_one(&mut *tx)
                .await?;
        if !has_car.0 {
            return Err(CoreError::PreconditionFailed("A driver must have a car".into()).into());
        }

        set_user_state(
            &mut *tx,
            driver_id,
            participant::FREE,
            participant::ON_TRACK_WAITING,
        )
        .await?;

        let query = format!(
            "INSERT INTO tracks \
                (driver_id, start_x, start_y, start_address, \
                 end_x, end_y, end_address, state_id, max_seats, \
                 driver_comment, departure_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, ''), $11) \
             RETURNING {}",
            track_repo::COLUMNS
        );
        let track = sqlx::query_as::<_, Track>(&query)
            .bind(driver_id)
            .bind(input.start_x)
            .bind(input.start_y)
            .bind(&input.start_address)
            .bind(input.end_x)
            .bind(input.end_y)
            .bind(&input.end_address)
            .bind(track_lifecycle::WAITING_PASSENGER)
            .bind(input.max_seats)
            .bind(&input.driver_comment)
            .bind(input.departure_time)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(track)
    }

    /// Seat a passenger: track WAITING_PASSENGER -> WAITING_DEPARTURE,
    /// passenger FREE -> ON_TRACK_WAITING.
    pub async fn add_passenger(
        pool: &PgPool,
        track_id: DbId,
        passenger_id: DbId,
    ) -> Result<Track, TripError> {
        let mut tx = pool.begin().await?;

        let track = load_track(&mut *tx, track_id).await?;
        if track.passenger_id.is_some() {
            return Err(CoreError::SeatTaken.into());
        }

        let passenger = load_user(&mut *tx, passenger_id).await?;
        if passenger.role != ROLE_PASSENGER {
            return Err(
                CoreError::WrongRole("Only a passenger can take the seat".into()).into(),
            );
        }

        track_lifecycle::validate_transition(track.state_id, track_lifecycle::WAITING_DEPARTURE)?;

        if passenger.state_id != participant::FREE {
            return Err(CoreError::PassengerBusy.into());
        }

        let query = format!(
            "UPDATE tracks \
             SET passenger_id = $2, state_id = $3 \
             WHERE id = $1 AND state_id = $4 AND passenger_id IS NULL \
             RETURNING {}",
            track_repo::COLUMNS
        );
        let updated = sqlx::query_as::<_, Track>(&query)
            .bind(track_id)
            .bind(passenger_id)
            .bind(track_lifecycle::WAITING_DEPARTURE)
            .bind(track.state_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TripError::Core(CoreError::ConcurrentModification))?;

        set_user_state(
            &mut *tx,
            passenger_id,
            participant::FREE,
            participant::ON_TRACK_WAITING,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Unseat the passenger: track WAITING_DEPARTURE -> WAITING_PASSENGER,
    /// passenger back to FREE, passenger comment cleared.
    ///
    /// Only the current passenger may leave the seat.
    pub async fn remove_passenger(
        pool: &PgPool,
        track_id: DbId,
        caller_id: DbId,
    ) -> Result<Track, TripError> {
        let mut tx = pool.begin().await?;

        let track = load_track(&mut *tx, track_id).await?;
        track_lifecycle::validate_transition(track.state_id, track_lifecycle::WAITING_PASSENGER)?;
        if !track.is_passenger(caller_id) {
            return Err(CoreError::NotParticipant.into());
        }

        let query = format!(
            "UPDATE tracks \
             SET passenger_id = NULL, state_id = $2, passenger_comment = '' \
             WHERE id = $1 AND state_id = $3 AND passenger_id = $4 \
             RETURNING {}",
            track_repo::COLUMNS
        );
        let updated = sqlx::query_as::<_, Track>(&query)
            .bind(track_id)
            .bind(track_lifecycle::WAITING_PASSENGER)
            .bind(track.state_id)
            .bind(caller_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TripError::Core(CoreError::ConcurrentModification))?;

        set_user_state(
            &mut *tx,
            caller_id,
            participant::ON_TRACK_WAITING,
            participant::FREE,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Depart: track WAITING_DEPARTURE -> ACTIVE, driver and passenger both
    /// -> ON_TRACK. Only the driver may depart, and only with a passenger
    /// seated.
    pub async fn depart(
        pool: &PgPool,
        track_id: DbId,
        caller_id: DbId,
    ) -> Result<Track, TripError> {
        let mut tx = pool.begin().await?;

        let track = load_track(&mut *tx, track_id).await?;
        if !track.is_driver(caller_id) {
            return Err(CoreError::NotParticipant.into());
        }

        track_lifecycle::validate_transition(track.state_id, track_lifecycle::ACTIVE)?;

        let passenger_id = track
            .passenger_id
            .ok_or_else(|| CoreError::PreconditionFailed("Track has no passenger".into()))?;

        let updated =
            set_track_state(&mut *tx, track_id, track.state_id, track_lifecycle::ACTIVE).await?;

        set_all_user_states(
            &mut *tx,
            &[track.driver_id, passenger_id],
            participant::ON_TRACK_WAITING,
            participant::ON_TRACK,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Finish: track ACTIVE -> FINISHED, driver and passenger both -> FREE.
    ///
    /// Either participant may finish the ride. The passenger reference stays
    /// on the finished row as a historical record.
    pub async fn finish(
        pool: &PgPool,
        track_id: DbId,
        caller_id: DbId,
    ) -> Result<Track, TripError> {
        let mut tx = pool.begin().await?;

        let track = load_track(&mut *tx, track_id).await?;
        if !track.is_driver(caller_id) && !track.is_passenger(caller_id) {
            return Err(CoreError::NotParticipant.into());
        }

        track_lifecycle::validate_transition(track.state_id, track_lifecycle::FINISHED)?;

        let updated =
            set_track_state(&mut *tx, track_id, track.state_id, track_lifecycle::FINISHED).await?;

        let mut rider_ids = vec![track.driver_id];
        rider_ids.extend(track.passenger_id);
        set_all_user_states(
            &mut *tx,
            &rider_ids,
            participant::ON_TRACK,
            participant::FREE,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a track that has not departed, resetting its participants to
    /// FREE. Only the driver may remove their track.
    pub async fn remove(pool: &PgPool, track_id: DbId, caller_id: DbId) -> Result<(), TripError> {
        let mut tx = pool.begin().await?;

        let track = load_track(&mut *tx, track_id).await?;
        if !track.is_driver(caller_id) {
            return Err(CoreError::NotParticipant.into());
        }
        if !track_lifecycle::can_remove(track.state_id) {
            return Err(CoreError::PreconditionFailed(format!(
                "Cannot remove a track in state {}",
                track_lifecycle::state_name(track.state_id)
            ))
            .into());
        }

        let result = sqlx::query("DELETE FROM tracks WHERE id = $1 AND state_id = $2")
            .bind(track_id)
            .bind(track.state_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::ConcurrentModification.into());
        }

        let mut rider_ids = vec![track.driver_id];
        rider_ids.extend(track.passenger_id);
        set_all_user_states(
            &mut *tx,
            &rider_ids,
            participant::ON_TRACK_WAITING,
            participant::FREE,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Set the driver or passenger comment, depending on which participant
    /// the caller is.
    pub async fn comment(
        pool: &PgPool,
        track_id: DbId,
        caller_id: DbId,
        text: &str,
    ) -> Result<Track, TripError> {
        validate_comment(text).map_err(CoreError::Validation)?;

        let track = crate::repositories::TrackRepo::find_by_id(pool, track_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Track",
                id: track_id,
            })?;

        let column = if track.is_driver(caller_id) {
            "driver_comment"
        } else if track.is_passenger(caller_id) {
            "passenger_comment"
        } else {
            return Err(CoreError::NotParticipant.into());
        };

        // The guard on the participant column covers a passenger swap
        // between the read and the write.
        let guard_column = if column == "driver_comment" {
            "driver_id"
        } else {
            "passenger_id"
        };
        let query = format!(
            "UPDATE tracks SET {column} = $2 \
             WHERE id = $1 AND {guard_column} = $3 \
             RETURNING {}",
            track_repo::COLUMNS
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(track_id)
            .bind(text)
            .bind(caller_id)
            .fetch_optional(pool)
            .await?
            .ok_or(TripError::Core(CoreError::ConcurrentModification))
    }

    /// Force-finish every non-FINISHED track whose departure time has
    /// passed. Bypasses the transition table: this is a terminal safety
    /// sweep, not a user action, and it is idempotent -- a second run over
    /// the same tracks matches nothing.
    ///
    /// When `reset_participants` is set, the affected drivers and
    /// passengers are reset to FREE in the same transaction; when not, they
    /// keep their on-track states (the legacy behavior, which strands them
    /// until set free by hand).
    ///
    /// Returns the number of tracks expired.
    pub async fn expire(
        pool: &PgPool,
        now: Timestamp,
        reset_participants: bool,
    ) -> Result<u64, TripError> {
        let mut tx = pool.begin().await?;

        let expired: Vec<(DbId, DbId, Option<DbId>)> = sqlx::query_as(
            "UPDATE tracks SET state_id = $1 \
             WHERE state_id <> $1 AND departure_time < $2 \
             RETURNING id, driver_id, passenger_id",
        )
        .bind(track_lifecycle::FINISHED)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if reset_participants && !expired.is_empty() {
            let mut rider_ids: Vec<DbId> = Vec::with_capacity(expired.len() * 2);
            for (_, driver_id, passenger_id) in &expired {
                rider_ids.push(*driver_id);
                rider_ids.extend(*passenger_id);
            }
            sqlx::query("UPDATE users SET state_id = $1 WHERE id = ANY($2)")
                .bind(participant::FREE)
                .bind(&rider_ids)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        if !expired.is_empty() {
            tracing::debug!(
                expired = expired.len(),
                reset_participants,
                "Force-finished overdue tracks"
            );
        }
        Ok(expired.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped helpers
// ---------------------------------------------------------------------------

/// Load a track inside the transaction, or fail with `NotFound`.
async fn load_track(conn: &mut PgConnection, id: DbId) -> Result<Track, TripError> {
    let query = format!("SELECT {} FROM tracks WHERE id = $1", track_repo::COLUMNS);
    sqlx::query_as::<_, Track>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "Track", id }.into())
}

/// Load a user inside the transaction, or fail with `NotFound`.
async fn load_user(conn: &mut PgConnection, id: DbId) -> Result<User, TripError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "User", id }.into())
}

/// Guarded track state flip. Returns the updated row, or
/// `ConcurrentModification` if the stored state no longer matches `from`.
async fn set_track_state(
    conn: &mut PgConnection,
    track_id: DbId,
    from: StateId,
    to: StateId,
) -> Result<Track, TripError> {
    let query = format!(
        "UPDATE tracks SET state_id = $2 \
         WHERE id = $1 AND state_id = $3 \
         RETURNING {}",
        track_repo::COLUMNS
    );
    sqlx::query_as::<_, Track>(&query)
        .bind(track_id)
        .bind(to)
        .bind(from)
        .fetch_optional(conn)
        .await?
        .ok_or(TripError::Core(CoreError::ConcurrentModification))
}

/// Guarded participant state flip for a single user.
async fn set_user_state(
    conn: &mut PgConnection,
    user_id: DbId,
    from: StateId,
    to: StateId,
) -> Result<(), TripError> {
    let result = sqlx::query("UPDATE users SET state_id = $2 WHERE id = $1 AND state_id = $3")
        .bind(user_id)
        .bind(to)
        .bind(from)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CoreError::ConcurrentModification.into());
    }
    Ok(())
}

/// Guarded participant state flip for several users at once; every row must
/// be applied or the whole operation rolls back.
async fn set_all_user_states(
    conn: &mut PgConnection,
    user_ids: &[DbId],
    from: StateId,
    to: StateId,
) -> Result<(), TripError> {
    let result =
        sqlx::query("UPDATE users SET state_id = $2 WHERE id = ANY($1) AND state_id = $3")
            .bind(user_ids)
            .bind(to)
            .bind(from)
            .execute(conn)
            .await?;
    if result.rows_affected() != user_ids.len() as u64 {
        return Err(CoreError::ConcurrentModification.into());
    }
    Ok(())
}
