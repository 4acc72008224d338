use std::sync::Arc;

use crate::auth::jwt::TokenService;
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::config::Config;
use crate::db::Store;

pub type SharedState = Arc<AppState>;

/// Built once at startup; read-only afterwards.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self, PasswordError> {
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_lifetime);
        let hasher = PasswordHasher::new(config.hash_cost)?;
        Ok(Self {
            config,
            store,
            tokens,
            hasher,
        })
    }
}
