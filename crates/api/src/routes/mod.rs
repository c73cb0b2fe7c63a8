//! API routes

pub mod account;
pub mod admin;
pub mod auth;
pub mod health;
pub mod heroes;
pub mod publishers;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{require_access_token, require_admin, require_refresh_token},
    state::AppState,
};

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Herodex API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public API routes (no auth required) - under /api/v1
    let public_api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password-reset-request", post(auth::password_reset_request));

    // The refresh route takes a refresh token, everything else an access token
    let refresh_api_routes = Router::new()
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_refresh_token,
        ));

    // Protected API routes (access token required) - under /api/v1
    let protected_api_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/account/me", get(account::me))
        .route("/account/update", patch(account::update_profile))
        .route("/heroes", get(heroes::list).post(heroes::create))
        .route(
            "/heroes/:hero_id",
            get(heroes::get).patch(heroes::update).delete(heroes::delete),
        )
        .route("/publishers", get(publishers::list).post(publishers::create))
        .route(
            "/publishers/:publisher_id",
            get(publishers::get)
                .patch(publishers::update)
                .delete(publishers::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token,
        ));

    // Admin routes: role gate inside the access gate. Layers run outermost
    // first, so the access gate is added last.
    let admin_api_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/:user_id",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token,
        ));

    // HTML pages opened from emailed links (no auth header; the token is in
    // the URL)
    let account_page_routes = Router::new()
        .route("/account/verify/:token", get(account::verify_page))
        .route(
            "/account/resend-verification/:token",
            get(account::resend_verification_page),
        )
        .route(
            "/account/password-reset-confirm/:token",
            get(account::password_reset_confirm_page).post(account::password_reset_confirm_submit),
        );

    let api_v1_routes = Router::new()
        .merge(public_api_routes)
        .merge(refresh_api_routes)
        .merge(protected_api_routes)
        .merge(admin_api_routes);

    Router::new()
        .route("/", get(root))
        .merge(health_routes)
        .merge(account_page_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_liveness_probe_responds() {
        let app = Router::new().route("/health/live", get(health::liveness));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = Router::new().route("/", get(root));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
