//! Handlers for the `/users` resource: registration, profile management,
//! car management, and state lookups.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ridepool_core::error::CoreError;
use ridepool_core::lifecycle::participant;
use ridepool_core::phone::validate_phone_number;
use ridepool_core::roles::{validate_role, ROLE_ADMIN};
use ridepool_core::types::DbId;
use ridepool_db::models::car::UpsertCar;
use ridepool_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use ridepool_db::repositories::{CarRepo, TrackRepo, UserRepo};
use serde::Deserialize;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::AuthResponse;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a user by ID or fail with `NotFound`.
async fn find_user(pool: &sqlx::PgPool, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

/// Verify the caller is the user themselves or an admin. `action` is used
/// in the error message (e.g. "edit", "delete").
fn authorize_owner(auth: &AuthUser, user_id: DbId, action: &str) -> AppResult<()> {
    if auth.user_id != user_id && auth.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's account"
        ))));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub phone_number: String,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// POST /api/v1/users
///
/// Register a new account. Returns 201 with an access token and the user,
/// so registration doubles as the first login.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    validate_phone_number(&input.phone_number)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_role(&input.role).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_password_strength(&input.password)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    if input.username.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "username must not be empty".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            phone_number: input.phone_number,
            username: input.username,
            password_hash,
            role: input.role,
        },
    )
    .await?;

    let token = generate_access_token(user.id, &user.phone_number, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.to_response(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = find_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse {
        data: user.to_response(),
    }))
}

/// GET /api/v1/users
///
/// List users, newest first. Supports `limit` and `offset`.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(User::to_response).collect(),
    }))
}

/// PUT /api/v1/users/{id}
///
/// Update username and/or role. Only the owner (or an admin) may edit.
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    authorize_owner(&auth, user_id, "edit")?;

    if let Some(role) = &input.role {
        validate_role(role).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let user = UserRepo::update(&state.pool, user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    Ok(Json(DataResponse {
        data: user.to_response(),
    }))
}

/// DELETE /api/v1/users/{id}
///
/// Delete an account. Refused while the user participates in a non-finished
/// track. Returns 204 on success.
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize_owner(&auth, user_id, "delete")?;

    if TrackRepo::find_active_by_user(&state.pool, user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::PreconditionFailed(
            "User still participates in an active track".into(),
        )));
    }

    let deleted = UserRepo::delete(&state.pool, user_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }));
    }

    tracing::info!(user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Request body for `POST /users/{id}/set_state`.
#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub new_state: String,
}

/// POST /api/v1/users/{id}/set_state
///
/// Manually override a participant state. An operational escape hatch --
/// normal lifecycle changes happen through the track endpoints -- but the
/// transition must still be legal.
pub async fn set_state(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<SetStateRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    authorize_owner(&auth, user_id, "change the state of")?;

    let new_state = participant::state_id(&input.new_state).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Invalid state '{}'",
            input.new_state
        )))
    })?;

    let user = find_user(&state.pool, user_id).await?;
    participant::validate_transition(user.state_id, new_state).map_err(AppError::Core)?;

    let user = UserRepo::set_state(&state.pool, user_id, new_state)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    tracing::info!(user_id, new_state = %input.new_state, "Participant state overridden");

    Ok(Json(DataResponse {
        data: user.to_response(),
    }))
}

// ---------------------------------------------------------------------------
// Car
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{id}/car
pub async fn get_car(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ridepool_db::models::car::Car>>> {
    let car = CarRepo::find_by_user(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Car",
            id: user_id,
        }))?;
    Ok(Json(DataResponse { data: car }))
}

/// PUT /api/v1/users/{id}/car
///
/// Create or replace the user's car. Only the owner may edit.
pub async fn update_car(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpsertCar>,
) -> AppResult<Json<DataResponse<ridepool_db::models::car::Car>>> {
    authorize_owner(&auth, user_id, "edit the car of")?;

    // 404 before FK violation for a missing user.
    find_user(&state.pool, user_id).await?;

    let car = CarRepo::upsert(&state.pool, user_id, &input).await?;
    Ok(Json(DataResponse { data: car }))
}

// ---------------------------------------------------------------------------
// Active track
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{id}/track
///
/// The non-finished track the user participates in, or 404.
pub async fn get_active_track(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ridepool_db::models::track::TrackResponse>>> {
    authorize_owner(&auth, user_id, "view the active track of")?;

    let track = TrackRepo::find_active_by_user(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Track",
            id: user_id,
        }))?;

    Ok(Json(DataResponse {
        data: track.to_response(),
    }))
}
