//! Authentication routes

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{hash_password, validate_password, verify_password},
    auth::{AccessClaims, ActionClaims, TokenUser},
    error::{ApiError, ApiResult},
    state::AppState,
    users::{NewUser, User},
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub detail: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct TokenUserResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: TokenUserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub detail: String,
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user account and send the verification email
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    if !state.config.enable_signup {
        return Err(ApiError::BadRequest(
            "Registration is currently disabled".to_string(),
        ));
    }

    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    validate_password(&req.password).map_err(|e| ApiError::Validation(e.to_string()))?;
    if req.username.trim().is_empty() || req.username.len() > 20 {
        return Err(ApiError::Validation(
            "Username must be between 1 and 20 characters".to_string(),
        ));
    }

    if state.users().email_exists(&req.email).await? {
        return Err(ApiError::EmailAlreadyExists);
    }
    if state.users().username_exists(&req.username).await? {
        return Err(ApiError::UsernameAlreadyExists);
    }

    let password_hash = hash_password(&req.password).map_err(|_| ApiError::Internal)?;

    let user = state
        .users()
        .create(NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            username: req.username.trim().to_string(),
            email: req.email,
            password_hash,
        })
        .await?;

    let now = OffsetDateTime::now_utc();
    let verify_token = state
        .tokens
        .create_url_safe_token(&ActionClaims::verification(&user.email, now))?;
    let resend_token = state
        .tokens
        .create_url_safe_token(&ActionClaims::resend_verification(&user.email))?;

    // Fire-and-forget: delivery must not block or fail the registration
    let email = state.email.clone();
    let email_user = user.clone();
    tokio::spawn(async move {
        email
            .send_verification_email(&email_user, &verify_token, &resend_token)
            .await;
    });

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            detail: "Account Created! Check email to verify your account".to_string(),
            user,
        }),
    ))
}

/// Authenticate with email and password, minting an access/refresh pair
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state.users().get_by_email(&req.email).await?;

    if !user.is_verified {
        return Err(ApiError::AccountNotVerified);
    }

    let password_valid =
        verify_password(&req.password, &user.password_hash).map_err(|_| ApiError::Internal)?;
    if !password_valid {
        tracing::warn!(email = %user.email, "Login failed: bad password");
        return Err(ApiError::InvalidCredentials);
    }

    let token_user = TokenUser {
        user_id: user.id,
        email: user.email.clone(),
        role: Some(user.role.clone()),
    };
    let (access_token, refresh_token) = state.tokens.create_token_pair(token_user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: state.config.token_type.clone(),
        expires_in: state.tokens.access_token_ttl_seconds(),
        user: TokenUserResponse {
            id: user.id,
            email: user.email,
        },
    }))
}

/// Mint a fresh token pair from a valid refresh token
///
/// The refresh gate has already validated the token; claims arrive as a
/// request extension.
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> ApiResult<Json<TokenResponse>> {
    // Re-resolve the user so the new access token carries the current role,
    // exactly as a login mint would
    let user = state.users().get_by_email(&claims.user.email).await?;
    let token_user = TokenUser {
        user_id: user.id,
        email: user.email.clone(),
        role: Some(user.role.clone()),
    };
    let (access_token, refresh_token) = state.tokens.create_token_pair(token_user)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: state.config.token_type.clone(),
        expires_in: state.tokens.access_token_ttl_seconds(),
        user: TokenUserResponse {
            id: user.id,
            email: user.email,
        },
    }))
}

/// Revoke the presented access token
///
/// The blocklist write is awaited: the token must be reliably dead before
/// the response goes out.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> ApiResult<Json<MessageResponse>> {
    let ttl = claims.remaining_ttl(OffsetDateTime::now_utc());
    state.blocklist.add(&claims.jti, ttl).await?;

    tracing::info!(user_id = %claims.user.user_id, "User logged out");

    Ok(Json(MessageResponse {
        detail: "Logged Out Successfully".to_string(),
    }))
}

/// Send a password-reset email with a single-use reset token
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.users().get_by_email(&req.email).await?;

    let reset_token = state
        .tokens
        .create_url_safe_token(&ActionClaims::password_reset(
            &user.email,
            OffsetDateTime::now_utc(),
        ))?;

    let email = state.email.clone();
    let recipient = user.email.clone();
    tokio::spawn(async move {
        email
            .send_password_reset_email(&recipient, &reset_token)
            .await;
    });

    Ok(Json(MessageResponse {
        detail: "Please check your email for instructions to reset your password".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format_check() {
        assert!(is_valid_email("hero@herodex.dev"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@herodex.dev"));
        assert!(!is_valid_email("hero@nodot"));
        assert!(!is_valid_email("hero@.dev."));
    }
}
