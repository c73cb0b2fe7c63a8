//! Account routes: emailed-link HTML pages and profile endpoints
//!
//! The token pages are opened from email clients, so they render HTML and
//! collapse every token problem into one permissive message. The only
//! failure that escapes that collapse is a revocation-store outage, which
//! must stay a 5xx rather than pass for a bad token.

use axum::{
    extract::{Path, State},
    response::Html,
    Extension, Form, Json,
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    auth::{hash_password, validate_password, AuthUser, TokenAction},
    error::{ApiError, ApiResult},
    state::AppState,
    users::User,
};

const INVALID_TOKEN_MSG: &str = "Oops... Invalid Token";
const USED_TOKEN_MSG: &str = "Token is invalid Or expired";

/// Minimal HTML shell shared by all account pages.
fn render_page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} - Herodex</title>
  <style>
    body {{ font-family: sans-serif; max-width: 32rem; margin: 4rem auto; padding: 0 1rem; }}
    input {{ display: block; width: 100%; margin: 0.5rem 0 1rem; padding: 0.5rem; }}
    button {{ padding: 0.5rem 1.5rem; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  {body}
</body>
</html>"#
    ))
}

fn message_page(title: &str, message: &str) -> Html<String> {
    render_page(title, &format!("<p>{message}</p>"))
}

// =============================================================================
// Email verification
// =============================================================================

/// Verify links carry plain claims; any tagged token belongs to another
/// flow and must not flip the verification flag.
fn check_verify_claims(claims: &crate::auth::ActionClaims) -> ApiResult<()> {
    if claims.action.is_some() {
        return Err(ApiError::InvalidToken);
    }
    Ok(())
}

async fn verify_account(state: &AppState, token: &str) -> ApiResult<&'static str> {
    let claims = state
        .tokens
        .decode_url_safe_token(token)
        .map_err(|_| ApiError::InvalidToken)?;
    check_verify_claims(&claims)?;

    let user = state.users().get_by_email(&claims.email).await?;

    if user.status.is_blocked() {
        return Ok("Account has been suspended. Try registering a new one");
    }
    if user.is_verified {
        return Ok("Account already verified");
    }

    state.users().mark_verified(user.id).await?;
    Ok("Account Verification Successful!")
}

/// Landing page for the emailed verify link.
pub async fn verify_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Html<String> {
    let message = match verify_account(&state, &token).await {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(error = %e, "Account verification failed");
            INVALID_TOKEN_MSG
        }
    };
    message_page("Account Verification", message)
}

// =============================================================================
// Resend verification
// =============================================================================

async fn resend_verification(state: &AppState, token: &str) -> ApiResult<&'static str> {
    let claims = state
        .tokens
        .decode_url_safe_token(token)
        .and_then(|claims| {
            claims.require_action(TokenAction::ResendVerification)?;
            Ok(claims)
        })
        .map_err(|_| ApiError::InvalidToken)?;

    let user = state.users().get_by_email(&claims.email).await?;

    if user.is_verified {
        return Ok("Account already verified");
    }

    let now = OffsetDateTime::now_utc();
    let verify_token = state
        .tokens
        .create_url_safe_token(&crate::auth::ActionClaims::verification(&user.email, now))?;
    let resend_token = state
        .tokens
        .create_url_safe_token(&crate::auth::ActionClaims::resend_verification(&user.email))?;

    let email = state.email.clone();
    tokio::spawn(async move {
        email
            .send_verification_email(&user, &verify_token, &resend_token)
            .await;
    });

    Ok("New verification email has been successfully sent")
}

/// Landing page for the emailed resend-verification link.
pub async fn resend_verification_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Html<String> {
    let message = match resend_verification(&state, &token).await {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(error = %e, "Resend verification failed");
            INVALID_TOKEN_MSG
        }
    };
    message_page("Resend Verification", message)
}

// =============================================================================
// Password reset confirmation
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Decode outcome + tag + consumption, as a pure decision.
///
/// A bad token and a consumed token render different messages: the consumed
/// branch means a previously valid link was replayed.
fn evaluate_reset_token(
    decoded: Result<crate::auth::ActionClaims, crate::auth::TokenError>,
    consumed: bool,
) -> Result<(crate::auth::ActionClaims, String), &'static str> {
    let claims = match decoded.and_then(|c| {
        c.require_action(TokenAction::PasswordReset)?;
        Ok(c)
    }) {
        Ok(claims) => claims,
        Err(_) => return Err(INVALID_TOKEN_MSG),
    };

    let Some(jti) = claims.jti.clone() else {
        return Err(INVALID_TOKEN_MSG);
    };

    if consumed {
        return Err(USED_TOKEN_MSG);
    }

    Ok((claims, jti))
}

/// Decode a reset token and check it has not already been consumed.
///
/// Redis errors propagate so an outage never reads as "not consumed".
async fn load_reset_claims(
    state: &AppState,
    token: &str,
) -> ApiResult<Result<(crate::auth::ActionClaims, String), &'static str>> {
    let decoded = state.tokens.decode_url_safe_token(token);

    let consumed = match &decoded {
        Ok(claims) => match &claims.jti {
            Some(jti) => state.blocklist.contains(jti).await?,
            None => false,
        },
        Err(_) => false,
    };

    Ok(evaluate_reset_token(decoded, consumed))
}

/// Form page for the emailed password-reset link.
pub async fn password_reset_confirm_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Html<String>> {
    match load_reset_claims(&state, &token).await? {
        Err(message) => Ok(message_page("Password Reset", message)),
        Ok(_) => {
            let form = format!(
                r#"<p>Please change your password</p>
  <form method="post" action="/account/password-reset-confirm/{token}">
    <label for="new_password">New password</label>
    <input type="password" id="new_password" name="new_password" required>
    <label for="confirm_new_password">Confirm new password</label>
    <input type="password" id="confirm_new_password" name="confirm_new_password" required>
    <button type="submit">Reset password</button>
  </form>"#
            );
            Ok(render_page("Password Reset", &form))
        }
    }
}

/// Apply the password change and consume the token.
pub async fn password_reset_confirm_submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<PasswordResetForm>,
) -> ApiResult<Html<String>> {
    let (claims, jti) = match load_reset_claims(&state, &token).await? {
        Err(message) => return Ok(message_page("Password Reset", message)),
        Ok(pair) => pair,
    };

    if form.new_password != form.confirm_new_password || validate_password(&form.new_password).is_err()
    {
        return Ok(message_page(
            "Password Reset",
            "Passwords did not match or check length of your password again.",
        ));
    }

    let user = match state.users().get_by_email(&claims.email).await {
        Ok(user) => user,
        Err(_) => return Ok(message_page("Password Reset", INVALID_TOKEN_MSG)),
    };

    let password_hash = hash_password(&form.new_password).map_err(|_| ApiError::Internal)?;
    state.users().update_password(user.id, &password_hash).await?;

    // Consume the token; the entry outlives the token's own expiry window
    let ttl = claims.remaining_ttl(OffsetDateTime::now_utc());
    state.blocklist.add(&jti, ttl).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(message_page("Password Reset", "Password reset Successfully"))
}

// =============================================================================
// Profile endpoints
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Current user's profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let user = state.users().get_by_id(auth.id).await?;
    Ok(Json(user))
}

/// Partial profile update; absent fields are left unchanged.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .users()
        .update_profile(
            auth.id,
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.phone.as_deref(),
        )
        .await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ActionClaims, TokenIssuer};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-key-at-least-32-chars!", 60, 2)
    }

    #[test]
    fn test_page_shell_contains_title_and_message() {
        let Html(page) = message_page("Account Verification", "Account already verified");
        assert!(page.contains("<title>Account Verification - Herodex</title>"));
        assert!(page.contains("Account already verified"));
    }

    #[test]
    fn test_verify_rejects_tagged_tokens() {
        let now = OffsetDateTime::now_utc();
        // Reset and resend tokens also carry an email; the verify flow must
        // not accept them
        let reset = ActionClaims::password_reset("hero@herodex.dev", now);
        assert!(matches!(
            check_verify_claims(&reset),
            Err(ApiError::InvalidToken)
        ));
        let resend = ActionClaims::resend_verification("hero@herodex.dev");
        assert!(matches!(
            check_verify_claims(&resend),
            Err(ApiError::InvalidToken)
        ));

        let verify = ActionClaims::verification("hero@herodex.dev", now);
        assert!(check_verify_claims(&verify).is_ok());
    }

    #[test]
    fn test_reset_token_is_single_use() {
        let issuer = issuer();
        let now = OffsetDateTime::now_utc();
        let token = issuer
            .create_url_safe_token(&ActionClaims::password_reset("hero@herodex.dev", now))
            .unwrap();

        // First use succeeds and yields the jti to consume
        let (claims, jti) =
            evaluate_reset_token(issuer.decode_url_safe_token(&token), false).unwrap();
        assert_eq!(claims.jti.as_deref(), Some(jti.as_str()));

        // Same token once the jti is in the blocklist: distinct message,
        // not the generic bad-token one
        let replayed = evaluate_reset_token(issuer.decode_url_safe_token(&token), true);
        assert_eq!(replayed, Err(USED_TOKEN_MSG));
        assert_ne!(USED_TOKEN_MSG, INVALID_TOKEN_MSG);
    }

    #[test]
    fn test_reset_rejects_wrong_flow_and_garbage() {
        let issuer = issuer();
        let resend = issuer
            .create_url_safe_token(&ActionClaims::resend_verification("hero@herodex.dev"))
            .unwrap();

        assert_eq!(
            evaluate_reset_token(issuer.decode_url_safe_token(&resend), false),
            Err(INVALID_TOKEN_MSG)
        );
        assert_eq!(
            evaluate_reset_token(issuer.decode_url_safe_token("garbage"), false),
            Err(INVALID_TOKEN_MSG)
        );
    }
}
