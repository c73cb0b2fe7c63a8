//! Shared application state

use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{TokenBlocklist, TokenIssuer};
use crate::config::Config;
use crate::email::EmailService;
use crate::users::UserRepo;

/// State shared across handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub tokens: TokenIssuer,
    pub blocklist: TokenBlocklist,
    pub email: EmailService,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: Config,
        blocklist: TokenBlocklist,
        email: EmailService,
    ) -> Self {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_expire_minutes,
            config.refresh_token_expire_days,
        );
        Self {
            pool,
            config: Arc::new(config),
            tokens,
            blocklist,
            email,
        }
    }

    pub fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }
}
