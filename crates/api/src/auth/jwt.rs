//! JWT generation and validation for access and refresh tokens

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Subject data embedded under the `user` claim.
///
/// Refresh tokens omit the role; it is re-resolved from the database when a
/// new access token is minted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUser {
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims carried by Herodex-issued access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Embedded subject info
    pub user: TokenUser,
    /// Expiration (unix timestamp)
    pub exp: i64,
    /// JWT ID, the unit of revocation
    pub jti: String,
    /// Distinguishes refresh tokens from access tokens
    pub refresh: bool,
}

impl AccessClaims {
    /// Seconds until this token expires, clamped at zero.
    ///
    /// Used as the blocklist TTL so revocation entries self-prune.
    pub fn remaining_ttl(&self, now: OffsetDateTime) -> u64 {
        (self.exp - now.unix_timestamp()).max(0) as u64
    }
}

/// Issues and validates signed tokens.
///
/// Constructed once at startup from [`crate::config::Config`] and shared via
/// [`crate::state::AppState`].
#[derive(Clone)]
pub struct TokenIssuer {
    pub(crate) encoding_key: EncodingKey,
    pub(crate) decoding_key: DecodingKey,
    access_token_expiry: Duration,
    refresh_token_expiry: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_expire_minutes: i64, refresh_expire_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry: Duration::minutes(access_expire_minutes),
            refresh_token_expiry: Duration::days(refresh_expire_days),
        }
    }

    /// Mint an access or refresh token with a fresh, unique `jti`.
    ///
    /// `expiry` overrides the configured TTL; two tokens minted for the same
    /// user are independently revocable.
    pub fn create_access_token(
        &self,
        user: TokenUser,
        expiry: Option<Duration>,
        refresh: bool,
    ) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let default_expiry = if refresh {
            self.refresh_token_expiry
        } else {
            self.access_token_expiry
        };
        let exp = now + expiry.unwrap_or(default_expiry);

        let claims = AccessClaims {
            user,
            exp: exp.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
            refresh,
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Mint an access/refresh pair for a login or refresh response.
    pub fn create_token_pair(&self, user: TokenUser) -> Result<(String, String), TokenError> {
        let refresh_user = TokenUser {
            role: None,
            ..user.clone()
        };
        let access_token = self.create_access_token(user, None, false)?;
        let refresh_token = self.create_access_token(refresh_user, None, true)?;
        Ok((access_token, refresh_token))
    }

    /// Validate signature and expiry, returning the decoded claims.
    ///
    /// Expired tokens keep a distinct error kind internally; the gate treats
    /// both as "re-authenticate".
    pub fn decode_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Configured access token lifetime in seconds.
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_expiry.whole_seconds()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Wrong token action")]
    WrongAction,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-key-at-least-32-chars!", 60, 2)
    }

    fn subject() -> TokenUser {
        TokenUser {
            user_id: Uuid::new_v4(),
            email: "hero@herodex.dev".to_string(),
            role: Some("USER".to_string()),
        }
    }

    #[test]
    fn test_round_trip() {
        let issuer = issuer();
        let user = subject();

        let token = issuer
            .create_access_token(user.clone(), None, false)
            .expect("mint failed");
        let claims = issuer.decode_token(&token).expect("decode failed");

        assert_eq!(claims.user, user);
        assert!(!claims.refresh);
        assert!(!claims.jti.is_empty());
        assert!(claims.exp > OffsetDateTime::now_utc().unix_timestamp());
    }

    #[test]
    fn test_jti_unique_per_mint() {
        let issuer = issuer();
        let user = subject();

        let a = issuer
            .create_access_token(user.clone(), None, false)
            .unwrap();
        let b = issuer.create_access_token(user, None, false).unwrap();

        assert_ne!(a, b);
        let jti_a = issuer.decode_token(&a).unwrap().jti;
        let jti_b = issuer.decode_token(&b).unwrap().jti;
        assert_ne!(jti_a, jti_b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let token = issuer
            .create_access_token(subject(), Some(Duration::seconds(-1)), false)
            .unwrap();

        assert!(matches!(
            issuer.decode_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let token = issuer.create_access_token(subject(), None, false).unwrap();
        let mut tampered = token.clone();
        tampered.pop();

        assert!(matches!(
            issuer.decode_token(&tampered),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new("another-secret-key-of-32-chars!!!", 60, 2);
        let token = issuer.create_access_token(subject(), None, false).unwrap();

        assert!(matches!(
            other.decode_token(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_token_pair_shapes() {
        let issuer = issuer();
        let (access, refresh) = issuer.create_token_pair(subject()).unwrap();

        let access_claims = issuer.decode_token(&access).unwrap();
        let refresh_claims = issuer.decode_token(&refresh).unwrap();

        assert!(!access_claims.refresh);
        assert!(refresh_claims.refresh);
        assert_eq!(access_claims.user.role.as_deref(), Some("USER"));
        // Refresh tokens carry no role
        assert_eq!(refresh_claims.user.role, None);
        assert_ne!(access_claims.jti, refresh_claims.jti);
        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_remaining_ttl_clamps_at_zero() {
        let now = OffsetDateTime::now_utc();
        let claims = AccessClaims {
            user: subject(),
            exp: now.unix_timestamp() - 30,
            jti: "x".to_string(),
            refresh: false,
        };
        assert_eq!(claims.remaining_ttl(now), 0);

        let live = AccessClaims {
            exp: now.unix_timestamp() + 120,
            ..claims
        };
        assert_eq!(live.remaining_ttl(now), 120);
    }
}
