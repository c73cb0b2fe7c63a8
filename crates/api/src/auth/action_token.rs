//! URL-safe action tokens for email verification and password reset
//!
//! Single-purpose tokens embedded in emailed links. They share the signing
//! secret with access tokens but carry a different claim shape, and each
//! flow gets its own action tag so a leaked token for one flow cannot be
//! replayed against another.

use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::jwt::{TokenError, TokenIssuer};

/// Verification links are valid for one hour.
pub const VERIFY_TOKEN_TTL_SECS: i64 = 3600;
/// Password reset links are valid for thirty minutes.
pub const RESET_TOKEN_TTL_SECS: i64 = 1800;

/// Discriminator for single-purpose tokens, serialized as a string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenAction {
    #[serde(rename = "resend_verification_link")]
    ResendVerification,
    #[serde(rename = "password_reset")]
    PasswordReset,
}

/// Claims carried by verification and password-reset tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionClaims {
    pub email: String,
    /// Absent on resend tokens, which live until consumed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Present only where single-use consumption is enforced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<TokenAction>,
}

impl ActionClaims {
    /// Claims for the emailed verify-account link.
    pub fn verification(email: &str, now: OffsetDateTime) -> Self {
        Self {
            email: email.to_string(),
            exp: Some(now.unix_timestamp() + VERIFY_TOKEN_TTL_SECS),
            jti: None,
            action: None,
        }
    }

    /// Claims for the companion resend-verification link. No expiry: the
    /// link stays usable until the account is verified.
    pub fn resend_verification(email: &str) -> Self {
        Self {
            email: email.to_string(),
            exp: None,
            jti: None,
            action: Some(TokenAction::ResendVerification),
        }
    }

    /// Claims for the password-reset link. The `jti` makes the token
    /// single-use via the revocation store.
    pub fn password_reset(email: &str, now: OffsetDateTime) -> Self {
        Self {
            email: email.to_string(),
            exp: Some(now.unix_timestamp() + RESET_TOKEN_TTL_SECS),
            jti: Some(Uuid::new_v4().to_string()),
            action: Some(TokenAction::PasswordReset),
        }
    }

    /// Seconds until expiry, clamped at zero. Tokens without `exp` report
    /// the reset TTL so blocklist entries still self-prune.
    pub fn remaining_ttl(&self, now: OffsetDateTime) -> u64 {
        match self.exp {
            Some(exp) => (exp - now.unix_timestamp()).max(0) as u64,
            None => RESET_TOKEN_TTL_SECS as u64,
        }
    }

    /// Check this token was minted for the expected flow.
    pub fn require_action(&self, expected: TokenAction) -> Result<(), TokenError> {
        if self.action == Some(expected) {
            Ok(())
        } else {
            Err(TokenError::WrongAction)
        }
    }
}

impl TokenIssuer {
    /// Encode action claims into a URL-safe signed token.
    pub fn create_url_safe_token(&self, claims: &ActionClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Decode an action token, verifying the signature and (when present)
    /// the expiry. `exp` is optional here, so the expiry check is done
    /// manually instead of through the library validation.
    pub fn decode_url_safe_token(&self, token: &str) -> Result<ActionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<ActionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)?;

        if let Some(exp) = claims.exp {
            if exp < OffsetDateTime::now_utc().unix_timestamp() {
                return Err(TokenError::Expired);
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-key-at-least-32-chars!", 60, 2)
    }

    #[test]
    fn test_verification_token_round_trip() {
        let issuer = issuer();
        let now = OffsetDateTime::now_utc();
        let claims = ActionClaims::verification("hero@herodex.dev", now);

        let token = issuer.create_url_safe_token(&claims).unwrap();
        let decoded = issuer.decode_url_safe_token(&token).unwrap();

        assert_eq!(decoded.email, "hero@herodex.dev");
        assert_eq!(decoded.action, None);
        assert_eq!(decoded.exp, Some(now.unix_timestamp() + VERIFY_TOKEN_TTL_SECS));
    }

    #[test]
    fn test_resend_token_has_no_expiry() {
        let issuer = issuer();
        let claims = ActionClaims::resend_verification("hero@herodex.dev");

        let token = issuer.create_url_safe_token(&claims).unwrap();
        let decoded = issuer.decode_url_safe_token(&token).unwrap();

        assert_eq!(decoded.exp, None);
        assert_eq!(decoded.action, Some(TokenAction::ResendVerification));
        assert!(decoded.require_action(TokenAction::ResendVerification).is_ok());
    }

    #[test]
    fn test_reset_token_is_tagged_and_single_use_capable() {
        let issuer = issuer();
        let now = OffsetDateTime::now_utc();
        let claims = ActionClaims::password_reset("hero@herodex.dev", now);

        let token = issuer.create_url_safe_token(&claims).unwrap();
        let decoded = issuer.decode_url_safe_token(&token).unwrap();

        assert_eq!(decoded.action, Some(TokenAction::PasswordReset));
        assert!(decoded.jti.is_some());
        assert!(decoded.remaining_ttl(now) > 0);
        assert!(decoded.remaining_ttl(now) <= RESET_TOKEN_TTL_SECS as u64);
    }

    #[test]
    fn test_action_tags_are_distinct() {
        // A resend token must never pass the password-reset action check
        let claims = ActionClaims::resend_verification("hero@herodex.dev");
        assert!(matches!(
            claims.require_action(TokenAction::PasswordReset),
            Err(TokenError::WrongAction)
        ));

        let reset = ActionClaims::password_reset("hero@herodex.dev", OffsetDateTime::now_utc());
        assert!(matches!(
            reset.require_action(TokenAction::ResendVerification),
            Err(TokenError::WrongAction)
        ));
    }

    #[test]
    fn test_expired_action_token_rejected() {
        let issuer = issuer();
        let now = OffsetDateTime::now_utc() - Duration::seconds(RESET_TOKEN_TTL_SECS + 1);
        let claims = ActionClaims::password_reset("hero@herodex.dev", now);

        let token = issuer.create_url_safe_token(&claims).unwrap();
        assert!(matches!(
            issuer.decode_url_safe_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = issuer();
        assert!(matches!(
            issuer.decode_url_safe_token("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }
}
