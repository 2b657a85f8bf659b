//! Integration tests for the trip orchestrator.
//!
//! Exercises the joint track/participant lifecycle against a real database:
//! - The full happy path (create -> add passenger -> depart -> finish)
//! - Every precondition and state-machine rejection
//! - The add/remove passenger round-trip
//! - The expiry sweep, including idempotence and participant reset

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use ridepool_core::error::CoreError;
use ridepool_core::lifecycle::{participant, track as track_lifecycle};
use ridepool_core::roles::{ROLE_DRIVER, ROLE_PASSENGER};
use ridepool_core::types::DbId;
use ridepool_db::error::TripError;
use ridepool_db::models::car::UpsertCar;
use ridepool_db::models::track::{CreateTrack, Track};
use ridepool_db::models::user::{CreateUser, User};
use ridepool_db::repositories::{CarRepo, TrackRepo, TripRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, phone: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            phone_number: phone.to_string(),
            username: format!("user-{phone}"),
            password_hash: "$argon2id$test-hash".to_string(),
            role: role.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// A driver with a car, ready to create tracks.
async fn create_driver(pool: &PgPool, phone: &str) -> User {
    let driver = create_user(pool, phone, ROLE_DRIVER).await;
    CarRepo::upsert(
        pool,
        driver.id,
        &UpsertCar {
            model: "Volvo 240".to_string(),
            color: "blue".to_string(),
            reg_number: "ABC-123".to_string(),
        },
    )
    .await
    .expect("car upsert should succeed");
    driver
}

async fn create_passenger(pool: &PgPool, phone: &str) -> User {
    create_user(pool, phone, ROLE_PASSENGER).await
}

fn new_track(departure_hours: i64) -> CreateTrack {
    CreateTrack {
        start_x: 10.0,
        start_y: 20.0,
        start_address: Some("Origin St 1".to_string()),
        end_x: 30.0,
        end_y: 40.0,
        end_address: None,
        max_seats: 1,
        driver_comment: Some("leaving from the north gate".to_string()),
        departure_time: Utc::now() + Duration::hours(departure_hours),
    }
}

async fn user_state(pool: &PgPool, id: DbId) -> i16 {
    UserRepo::find_by_id(pool, id)
        .await
        .unwrap()
        .expect("user should exist")
        .state_id
}

async fn track_state(pool: &PgPool, id: DbId) -> i16 {
    TrackRepo::find_by_id(pool, id)
        .await
        .unwrap()
        .expect("track should exist")
        .state_id
}

/// Backdate a track's departure so the expiry sweep picks it up. Tracks
/// with a past departure cannot be created through the orchestrator.
async fn backdate_departure(pool: &PgPool, track_id: DbId, hours_ago: i64) {
    sqlx::query("UPDATE tracks SET departure_time = $2 WHERE id = $1")
        .bind(track_id)
        .bind(Utc::now() - Duration::hours(hours_ago))
        .execute(pool)
        .await
        .unwrap();
}

/// Shorthand: a driver, a passenger, and a track in WAITING_DEPARTURE.
async fn seated_track(pool: &PgPool) -> (User, User, Track) {
    let driver = create_driver(pool, "5550000001").await;
    let passenger = create_passenger(pool, "5550000002").await;
    let track = TripRepo::create(pool, driver.id, &new_track(2)).await.unwrap();
    let track = TripRepo::add_passenger(pool, track.id, passenger.id)
        .await
        .unwrap();
    (driver, passenger, track)
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn full_lifecycle_happy_path(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let passenger = create_passenger(&pool, "5550000002").await;

    // Driver creates a track departing in one hour.
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();
    assert_eq!(track.state_id, track_lifecycle::WAITING_PASSENGER);
    assert_eq!(track.driver_id, driver.id);
    assert_eq!(track.passenger_id, None);
    assert_eq!(user_state(&pool, driver.id).await, participant::ON_TRACK_WAITING);

    // Passenger joins.
    let track = TripRepo::add_passenger(&pool, track.id, passenger.id)
        .await
        .unwrap();
    assert_eq!(track.state_id, track_lifecycle::WAITING_DEPARTURE);
    assert_eq!(track.passenger_id, Some(passenger.id));
    assert_eq!(
        user_state(&pool, passenger.id).await,
        participant::ON_TRACK_WAITING
    );

    // Driver departs.
    let track = TripRepo::depart(&pool, track.id, driver.id).await.unwrap();
    assert_eq!(track.state_id, track_lifecycle::ACTIVE);
    assert_eq!(user_state(&pool, driver.id).await, participant::ON_TRACK);
    assert_eq!(user_state(&pool, passenger.id).await, participant::ON_TRACK);

    // Driver finishes.
    let track = TripRepo::finish(&pool, track.id, driver.id).await.unwrap();
    assert_eq!(track.state_id, track_lifecycle::FINISHED);
    assert_eq!(user_state(&pool, driver.id).await, participant::FREE);
    assert_eq!(user_state(&pool, passenger.id).await, participant::FREE);
}

// ---------------------------------------------------------------------------
// create preconditions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_requires_driver_role(pool: PgPool) {
    let passenger = create_passenger(&pool, "5550000001").await;
    let err = TripRepo::create(&pool, passenger.id, &new_track(1))
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::PreconditionFailed(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_requires_car(pool: PgPool) {
    let driver = create_user(&pool, "5550000001", ROLE_DRIVER).await;
    let err = TripRepo::create(&pool, driver.id, &new_track(1))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        TripError::Core(CoreError::PreconditionFailed(ref msg)) if msg.contains("car")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn create_requires_free_driver(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    // Second track while still ON_TRACK_WAITING.
    let err = TripRepo::create(&pool, driver.id, &new_track(2))
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::PreconditionFailed(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rejects_past_departure(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let err = TripRepo::create(&pool, driver.id, &new_track(-1))
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::Validation(_)));
    // No partial write: the driver must still be FREE.
    assert_eq!(user_state(&pool, driver.id).await, participant::FREE);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rejects_departure_beyond_horizon(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let err = TripRepo::create(&pool, driver.id, &new_track(49))
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rejects_zero_seats(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let mut input = new_track(1);
    input.max_seats = 0;
    let err = TripRepo::create(&pool, driver.id, &input).await.unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// add_passenger preconditions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn add_passenger_to_missing_track_fails(pool: PgPool) {
    let passenger = create_passenger(&pool, "5550000001").await;
    let err = TripRepo::add_passenger(&pool, 9999, passenger.id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        TripError::Core(CoreError::NotFound { entity: "Track", .. })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn second_passenger_finds_seat_taken(pool: PgPool) {
    let (_driver, _passenger, track) = seated_track(&pool).await;
    let late = create_passenger(&pool, "5550000003").await;

    let err = TripRepo::add_passenger(&pool, track.id, late.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::SeatTaken));
    // The loser is untouched.
    assert_eq!(user_state(&pool, late.id).await, participant::FREE);
}

#[sqlx::test(migrations = "./migrations")]
async fn add_passenger_rejects_wrong_role(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let other_driver = create_driver(&pool, "5550000002").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    let err = TripRepo::add_passenger(&pool, track.id, other_driver.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::WrongRole(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn add_passenger_rejects_busy_passenger(pool: PgPool) {
    let driver_a = create_driver(&pool, "5550000001").await;
    let driver_b = create_driver(&pool, "5550000002").await;
    let passenger = create_passenger(&pool, "5550000003").await;

    let track_a = TripRepo::create(&pool, driver_a.id, &new_track(1)).await.unwrap();
    let track_b = TripRepo::create(&pool, driver_b.id, &new_track(2)).await.unwrap();

    TripRepo::add_passenger(&pool, track_a.id, passenger.id)
        .await
        .unwrap();
    let err = TripRepo::add_passenger(&pool, track_b.id, passenger.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::PassengerBusy));
}

// ---------------------------------------------------------------------------
// remove_passenger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn add_then_remove_passenger_round_trips(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let passenger = create_passenger(&pool, "5550000002").await;
    let before = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    TripRepo::add_passenger(&pool, before.id, passenger.id)
        .await
        .unwrap();
    TripRepo::comment(&pool, before.id, passenger.id, "see you there")
        .await
        .unwrap();

    let after = TripRepo::remove_passenger(&pool, before.id, passenger.id)
        .await
        .unwrap();

    // Track restored to its pre-add state exactly.
    assert_eq!(after.state_id, track_lifecycle::WAITING_PASSENGER);
    assert_eq!(after.passenger_id, None);
    assert_eq!(after.passenger_comment, "");
    assert_eq!(after.driver_comment, before.driver_comment);

    // Passenger restored to FREE; driver untouched.
    assert_eq!(user_state(&pool, passenger.id).await, participant::FREE);
    assert_eq!(user_state(&pool, driver.id).await, participant::ON_TRACK_WAITING);
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_passenger_requires_current_passenger(pool: PgPool) {
    let (_driver, _passenger, track) = seated_track(&pool).await;
    let stranger = create_passenger(&pool, "5550000003").await;

    let err = TripRepo::remove_passenger(&pool, track.id, stranger.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::NotParticipant));
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_passenger_requires_waiting_departure(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let passenger = create_passenger(&pool, "5550000002").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    // No passenger seated yet: WAITING_PASSENGER -> WAITING_PASSENGER is
    // not a legal transition.
    let err = TripRepo::remove_passenger(&pool, track.id, passenger.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::IllegalStateTransition { .. }));
}

// ---------------------------------------------------------------------------
// depart
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn depart_from_waiting_passenger_is_illegal(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    let err = TripRepo::depart(&pool, track.id, driver.id).await.unwrap_err();
    assert_matches!(
        err,
        TripError::Core(CoreError::IllegalStateTransition {
            from: "WAITING_PASSENGER",
            to: "ACTIVE"
        })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn depart_requires_driver(pool: PgPool) {
    let (_driver, passenger, track) = seated_track(&pool).await;

    let err = TripRepo::depart(&pool, track.id, passenger.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::NotParticipant));
}

// ---------------------------------------------------------------------------
// finish
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn finish_before_departure_is_illegal(pool: PgPool) {
    let (driver, _passenger, track) = seated_track(&pool).await;

    let err = TripRepo::finish(&pool, track.id, driver.id).await.unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::IllegalStateTransition { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn double_finish_fails_the_second_time(pool: PgPool) {
    let (driver, _passenger, track) = seated_track(&pool).await;
    TripRepo::depart(&pool, track.id, driver.id).await.unwrap();
    TripRepo::finish(&pool, track.id, driver.id).await.unwrap();

    let err = TripRepo::finish(&pool, track.id, driver.id).await.unwrap_err();
    assert_matches!(
        err,
        TripError::Core(CoreError::IllegalStateTransition {
            from: "FINISHED",
            to: "FINISHED"
        })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn passenger_may_finish(pool: PgPool) {
    let (driver, passenger, track) = seated_track(&pool).await;
    TripRepo::depart(&pool, track.id, driver.id).await.unwrap();

    let track = TripRepo::finish(&pool, track.id, passenger.id).await.unwrap();
    assert_eq!(track.state_id, track_lifecycle::FINISHED);
}

#[sqlx::test(migrations = "./migrations")]
async fn passenger_reference_survives_finish(pool: PgPool) {
    let (driver, passenger, track) = seated_track(&pool).await;
    TripRepo::depart(&pool, track.id, driver.id).await.unwrap();
    let track = TripRepo::finish(&pool, track.id, driver.id).await.unwrap();

    // Historical record: the seat assignment stays on the finished row.
    assert_eq!(track.passenger_id, Some(passenger.id));
}

// ---------------------------------------------------------------------------
// remove
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn remove_frees_driver_and_passenger(pool: PgPool) {
    let (driver, passenger, track) = seated_track(&pool).await;

    TripRepo::remove(&pool, track.id, driver.id).await.unwrap();

    assert!(TrackRepo::find_by_id(&pool, track.id).await.unwrap().is_none());
    assert_eq!(user_state(&pool, driver.id).await, participant::FREE);
    assert_eq!(user_state(&pool, passenger.id).await, participant::FREE);
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_refused_once_active(pool: PgPool) {
    let (driver, _passenger, track) = seated_track(&pool).await;
    TripRepo::depart(&pool, track.id, driver.id).await.unwrap();

    let err = TripRepo::remove(&pool, track.id, driver.id).await.unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::PreconditionFailed(_)));
    assert!(TrackRepo::find_by_id(&pool, track.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_requires_driver(pool: PgPool) {
    let (_driver, passenger, track) = seated_track(&pool).await;

    let err = TripRepo::remove(&pool, track.id, passenger.id)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::NotParticipant));
}

// ---------------------------------------------------------------------------
// comment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn comment_routes_to_the_right_column(pool: PgPool) {
    let (driver, passenger, track) = seated_track(&pool).await;

    let track = TripRepo::comment(&pool, track.id, driver.id, "north gate")
        .await
        .unwrap();
    assert_eq!(track.driver_comment, "north gate");

    let track = TripRepo::comment(&pool, track.id, passenger.id, "running late")
        .await
        .unwrap();
    assert_eq!(track.passenger_comment, "running late");
    assert_eq!(track.driver_comment, "north gate");
}

#[sqlx::test(migrations = "./migrations")]
async fn comment_by_stranger_fails(pool: PgPool) {
    let (_driver, _passenger, track) = seated_track(&pool).await;
    let stranger = create_passenger(&pool, "5550000003").await;

    let err = TripRepo::comment(&pool, track.id, stranger.id, "hello")
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::NotParticipant));
}

#[sqlx::test(migrations = "./migrations")]
async fn overlong_comment_rejected(pool: PgPool) {
    let (driver, _passenger, track) = seated_track(&pool).await;

    let text = "x".repeat(1001);
    let err = TripRepo::comment(&pool, track.id, driver.id, &text)
        .await
        .unwrap_err();
    assert_matches!(err, TripError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// expire
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn expire_finishes_overdue_track_without_passenger(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();
    backdate_departure(&pool, track.id, 2).await;

    let expired = TripRepo::expire(&pool, Utc::now(), false).await.unwrap();
    assert_eq!(expired, 1);
    assert_eq!(track_state(&pool, track.id).await, track_lifecycle::FINISHED);
}

#[sqlx::test(migrations = "./migrations")]
async fn expire_is_idempotent(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();
    backdate_departure(&pool, track.id, 2).await;

    assert_eq!(TripRepo::expire(&pool, Utc::now(), false).await.unwrap(), 1);
    assert_eq!(TripRepo::expire(&pool, Utc::now(), false).await.unwrap(), 0);
    assert_eq!(track_state(&pool, track.id).await, track_lifecycle::FINISHED);
}

#[sqlx::test(migrations = "./migrations")]
async fn expire_skips_future_tracks(pool: PgPool) {
    let driver = create_driver(&pool, "5550000001").await;
    let track = TripRepo::create(&pool, driver.id, &new_track(1)).await.unwrap();

    assert_eq!(TripRepo::expire(&pool, Utc::now(), false).await.unwrap(), 0);
    assert_eq!(
        track_state(&pool, track.id).await,
        track_lifecycle::WAITING_PASSENGER
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn expire_resets_participants_when_asked(pool: PgPool) {
    let (driver, passenger, track) = seated_track(&pool).await;
    backdate_departure(&pool, track.id, 1).await;

    TripRepo::expire(&pool, Utc::now(), true).await.unwrap();

    assert_eq!(track_state(&pool, track.id).await, track_lifecycle::FINISHED);
    assert_eq!(user_state(&pool, driver.id).await, participant::FREE);
    assert_eq!(user_state(&pool, passenger.id).await, participant::FREE);
}

#[sqlx::test(migrations = "./migrations")]
async fn expire_without_reset_strands_participants(pool: PgPool) {
    // The legacy behavior: the track finishes but the riders keep their
    // on-track states.
    let (driver, passenger, track) = seated_track(&pool).await;
    backdate_departure(&pool, track.id, 1).await;

    TripRepo::expire(&pool, Utc::now(), false).await.unwrap();

    assert_eq!(track_state(&pool, track.id).await, track_lifecycle::FINISHED);
    assert_eq!(
        user_state(&pool, driver.id).await,
        participant::ON_TRACK_WAITING
    );
    assert_eq!(
        user_state(&pool, passenger.id).await,
        participant::ON_TRACK_WAITING
    );
}
