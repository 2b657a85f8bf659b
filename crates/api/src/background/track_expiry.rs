//! Periodic expiry sweep for overdue tracks.
//!
//! Spawns a background task that force-finishes every non-FINISHED track
//! whose departure time has passed. Runs on a fixed interval using
//! `tokio::time::interval`; the sweep itself is idempotent, so an extra run
//! is harmless.

use std::time::Duration;

use chrono::Utc;
use ridepool_db::repositories::TripRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Default sweep interval in seconds.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Run the track expiry loop.
///
/// Reads its tuning from the environment:
///
/// | Env Var                            | Default |
/// |------------------------------------|---------|
/// | `TRACK_EXPIRY_INTERVAL_SECS`       | `60`    |
/// | `TRACK_EXPIRY_RESET_PARTICIPANTS`  | `true`  |
///
/// With `TRACK_EXPIRY_RESET_PARTICIPANTS=false` the sweep only flips the
/// track state and leaves the riders in their on-track states, matching the
/// legacy behavior. Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("TRACK_EXPIRY_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    let reset_participants: bool = std::env::var("TRACK_EXPIRY_RESET_PARTICIPANTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(true);

    tracing::info!(
        interval_secs,
        reset_participants,
        "Track expiry sweep started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Track expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match TripRepo::expire(&pool, Utc::now(), reset_participants).await {
                    Ok(expired) => {
                        if expired > 0 {
                            tracing::info!(expired, "Track expiry: force-finished overdue tracks");
                        } else {
                            tracing::debug!("Track expiry: nothing overdue");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Track expiry: sweep failed");
                    }
                }
            }
        }
    }
}
