pub mod auth_handler;
pub mod user_handler;

use crate::config::Config;
use sqlx::PgPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}
