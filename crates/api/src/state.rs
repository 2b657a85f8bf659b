use std::sync::Arc;

use crate::config::ServerConfig;

/// State handed to every handler via `State<AppState>`. Cloned per
/// request, so everything in here is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: ridepool_db::DbPool,
    pub config: Arc<ServerConfig>,
}
