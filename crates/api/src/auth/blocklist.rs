//! Token revocation store backed by Redis
//!
//! Revoked `jti` values are stored with a TTL equal to the token's remaining
//! lifetime, so the store self-prunes and never accumulates stale entries.
//! Connectivity failures propagate to the caller: an unreachable store must
//! reject the request rather than let a possibly-revoked token through.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

fn blocklist_key(jti: &str) -> String {
    format!("token:blocklist:{jti}")
}

/// Revocation store over a shared Redis connection
#[derive(Clone)]
pub struct TokenBlocklist {
    redis: ConnectionManager,
}

impl TokenBlocklist {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Record a revoked `jti`. Idempotent; safe to retry.
    pub async fn add(&self, jti: &str, ttl_seconds: u64) -> Result<(), redis::RedisError> {
        // A zero TTL would make SET EX fail; an already-expired token still
        // gets a minimal entry so a concurrent request cannot race past it.
        let ttl = ttl_seconds.max(1);
        let mut conn = self.redis.clone();
        let _: () = conn.set_ex(blocklist_key(jti), "", ttl).await?;

        tracing::info!(jti = %jti, ttl = ttl, "Token jti added to blocklist");
        Ok(())
    }

    /// Membership check, consulted on every gated request.
    pub async fn contains(&self, jti: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.clone();
        conn.exists(blocklist_key(jti)).await
    }

    /// Connectivity check for readiness probes.
    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
