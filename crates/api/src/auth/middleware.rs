//! Authorization gate
//!
//! Every gated request walks the same pipeline: bearer extraction, token
//! decode, revocation check, token-kind check, then (for access gates) user
//! resolution and account-status check. The pipeline produces typed
//! [`ApiError`] rejections; status codes are assigned only in `error.rs`.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use uuid::Uuid;

use herodex_shared::{roles, AccountStatus};

use super::jwt::{AccessClaims, TokenError};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Which token kind a gate requires. The two gate variants share the whole
/// pipeline and diverge only on the `refresh` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    AccessRequired,
    RefreshRequired,
}

/// Authenticated user resolved by the access gate, available to handlers as
/// a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
    pub status: AccountStatus,
}

/// Pull the token out of the `Authorization: Bearer <token>` header.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::NotAuthenticated)?;
    let value = value.to_str().map_err(|_| ApiError::NotAuthenticated)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(ApiError::NotAuthenticated)?;
    if token.is_empty() {
        return Err(ApiError::NotAuthenticated);
    }
    Ok(token)
}

/// Decode outcome + revocation + kind check, as a pure decision.
///
/// Expired, malformed, and revoked tokens are indistinguishable to the
/// client; all collapse to `InvalidToken`.
pub(crate) fn evaluate_token(
    decoded: Result<AccessClaims, TokenError>,
    revoked: bool,
    kind: TokenKind,
) -> ApiResult<AccessClaims> {
    let claims = decoded.map_err(|_| ApiError::InvalidToken)?;
    if revoked {
        return Err(ApiError::InvalidToken);
    }
    check_token_kind(&claims, kind)?;
    Ok(claims)
}

pub(crate) fn check_token_kind(claims: &AccessClaims, kind: TokenKind) -> ApiResult<()> {
    match kind {
        TokenKind::AccessRequired if claims.refresh => Err(ApiError::AccessTokenRequired),
        TokenKind::RefreshRequired if !claims.refresh => Err(ApiError::RefreshTokenRequired),
        _ => Ok(()),
    }
}

pub(crate) fn check_account_status(status: AccountStatus) -> ApiResult<()> {
    if status.is_blocked() {
        Err(ApiError::AccountSuspended)
    } else {
        Ok(())
    }
}

/// Role predicate composed on top of the access gate. Unverified accounts
/// are rejected before the role is even considered.
pub(crate) fn check_role(user: &AuthUser, allowed: &[&str]) -> ApiResult<()> {
    if !user.is_verified {
        return Err(ApiError::AccountNotVerified);
    }
    if allowed.iter().any(|r| r.eq_ignore_ascii_case(&user.role)) {
        Ok(())
    } else {
        Err(ApiError::InsufficientPermission)
    }
}

async fn authorize(state: &AppState, req: &mut Request, kind: TokenKind) -> ApiResult<()> {
    let token = extract_bearer(req.headers())?;
    let decoded = state.tokens.decode_token(token);

    // Revocation check needs the jti, so a decode failure short-circuits
    // before the store round-trip.
    let claims = match decoded {
        Ok(claims) => {
            let revoked = state.blocklist.contains(&claims.jti).await?;
            evaluate_token(Ok(claims), revoked, kind)?
        }
        Err(e) => evaluate_token(Err(e), false, kind)?,
    };

    if kind == TokenKind::AccessRequired {
        let user = state.users().get_by_email(&claims.user.email).await?;
        check_account_status(user.status)?;
        req.extensions_mut().insert(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            status: user.status,
        });
    }

    req.extensions_mut().insert(claims);
    Ok(())
}

/// Gate for routes that require a non-refresh access token.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    authorize(&state, &mut req, TokenKind::AccessRequired).await?;
    Ok(next.run(req).await)
}

/// Gate for the token-refresh route, which requires a refresh token.
pub async fn require_refresh_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    authorize(&state, &mut req, TokenKind::RefreshRequired).await?;
    Ok(next.run(req).await)
}

/// Role gate for admin routes; layered inside the access gate.
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    check_role(&user, &[roles::ADMIN])?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenIssuer, TokenUser};
    use axum::http::{HeaderValue, StatusCode};

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

    fn auth_user(role: &str, is_verified: bool, status: AccountStatus) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "hero@herodex.dev".to_string(),
            role: role.to_string(),
            is_verified,
            status,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer my-token");
        assert_eq!(extract_bearer(&headers).unwrap(), "my-token");

        assert!(matches!(
            extract_bearer(&HeaderMap::new()),
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            extract_bearer(&headers_with("Basic dXNlcjpwYXNz")),
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            extract_bearer(&headers_with("Bearer ")),
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_refresh_token_rejected_by_access_gate() {
        let issuer = issuer();
        let token = issuer.create_access_token(subject(), None, true).unwrap();
        let decoded = issuer.decode_token(&token);

        let err = evaluate_token(decoded, false, TokenKind::AccessRequired).unwrap_err();
        assert!(matches!(err, ApiError::AccessTokenRequired));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_access_token_rejected_by_refresh_gate() {
        let issuer = issuer();
        let token = issuer.create_access_token(subject(), None, false).unwrap();
        let decoded = issuer.decode_token(&token);

        let err = evaluate_token(decoded, false, TokenKind::RefreshRequired).unwrap_err();
        assert!(matches!(err, ApiError::RefreshTokenRequired));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_revoked_token_rejected_after_logout() {
        let issuer = issuer();
        let token = issuer.create_access_token(subject(), None, false).unwrap();

        // Before revocation the gate authorizes
        let claims =
            evaluate_token(issuer.decode_token(&token), false, TokenKind::AccessRequired).unwrap();
        assert!(!claims.jti.is_empty());

        // Same token after its jti lands in the blocklist
        let err = evaluate_token(issuer.decode_token(&token), true, TokenKind::AccessRequired)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_decode_failure_maps_to_invalid_token() {
        let issuer = issuer();
        let err = evaluate_token(
            issuer.decode_token("garbage"),
            false,
            TokenKind::AccessRequired,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn test_blocked_account_states() {
        assert!(matches!(
            check_account_status(AccountStatus::Suspended),
            Err(ApiError::AccountSuspended)
        ));
        assert!(matches!(
            check_account_status(AccountStatus::Inactive),
            Err(ApiError::AccountSuspended)
        ));
        assert!(check_account_status(AccountStatus::Active).is_ok());
        assert!(check_account_status(AccountStatus::Pending).is_ok());
    }

    #[test]
    fn test_role_check_requires_verification_first() {
        let unverified = auth_user(roles::ADMIN, false, AccountStatus::Pending);
        assert!(matches!(
            check_role(&unverified, &[roles::ADMIN]),
            Err(ApiError::AccountNotVerified)
        ));
    }

    #[test]
    fn test_role_allow_list() {
        let admin = auth_user("ADMIN", true, AccountStatus::Active);
        assert!(check_role(&admin, &[roles::ADMIN]).is_ok());
        // Case-insensitive match on stored role values
        let mixed = auth_user("Admin", true, AccountStatus::Active);
        assert!(check_role(&mixed, &[roles::ADMIN]).is_ok());

        let user = auth_user("USER", true, AccountStatus::Active);
        let err = check_role(&user, &[roles::ADMIN]).unwrap_err();
        assert!(matches!(err, ApiError::InsufficientPermission));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
