//! Shared application state.
//!
//! One state type cloned into every handler. All fields are cheap to clone
//! (the pool is reference-counted, the config and JWT manager are small).

use vault_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState { db, config, jwt }
    }
}
