//! Herodex API server entry point

use anyhow::Context;
use redis::aio::ConnectionManager;
use tracing_subscriber::EnvFilter;

use herodex_api::{
    auth::TokenBlocklist,
    email::{EmailConfig, EmailService},
    routes, AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = herodex_shared::db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    herodex_shared::db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let redis_client =
        redis::Client::open(config.redis_url.clone()).context("Invalid Redis URL")?;
    let redis = ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    let blocklist = TokenBlocklist::new(redis);

    let email = EmailService::new(EmailConfig {
        resend_api_key: config.resend_api_key.clone(),
        email_from: config.email_from.clone(),
        public_url: config.public_url.clone(),
    });

    let bind_address = config.bind_address.clone();
    let state = AppState::new(pool, config, blocklist, email);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Herodex API listening on {}", bind_address);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
