//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
///
/// Constructed once in `main` and handed to the token issuer, gate, and
/// handlers through `AppState`; nothing reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub public_url: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis (token blocklist)
    pub redis_url: String,

    // Authentication
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub token_type: String,

    // Email
    pub resend_api_key: String,
    pub email_from: String,

    // Feature flags
    pub enable_signup: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Redis
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                // Ensure the signing key is cryptographically strong
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            refresh_token_expire_days: env::var("REFRESH_TOKEN_EXPIRE_DAYS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            token_type: env::var("TOKEN_TYPE").unwrap_or_else(|_| "Bearer".to_string()),

            // Email
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Herodex <noreply@localhost>".to_string()),

            // Feature flags
            enable_signup: env::var("ENABLE_SIGNUP")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Config tests mutate shared env vars, so they run serially
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    fn cleanup_config() {
        env::remove_var("DATABASE_URL");
        env::remove_var("JWT_SECRET");
    }

    #[test]
    fn test_jwt_secret_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        // Missing secret
        setup_minimal_config();
        env::remove_var("JWT_SECRET");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        // Short secret rejected
        env::set_var("JWT_SECRET", "too-short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::WeakSecret(_))
        ));

        // Valid config picks up defaults
        setup_minimal_config();
        let config = Config::from_env().unwrap();
        assert_eq!(config.access_token_expire_minutes, 60);
        assert_eq!(config.refresh_token_expire_days, 2);
        assert_eq!(config.token_type, "Bearer");

        cleanup_config();
    }
}
