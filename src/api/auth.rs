use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::security;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::auth::{AdminLogin, AdminResponse, TokenResponse};

/// Max attempts per window for login endpoints.
pub(crate) const LOGIN_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
pub(crate) const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;

const INVALID_CREDENTIALS: &str = "Invalid credentials!";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate().map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;
    let username = payload.username.trim();

    let rate_key = format!("rl:admin-login:{username}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let admin = repositories::admins::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
        .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &admin.hashed_password)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;
    if !verified {
        tracing::info!(%username, "Rejected admin login");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = security::create_admin_token(admin.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(admin_id = admin.id, "Admin logged in");
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        admin: AdminResponse::from_db(admin),
    }))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentAdmin,
) -> Result<StatusCode, ApiError> {
    let remaining = current.expires_at - OffsetDateTime::now_utc().unix_timestamp();
    let fingerprint = security::token_fingerprint(&current.token);

    match state.redis().revoke_token(&fingerprint, remaining.max(1) as u64).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Redis unavailable; logged-out token stays valid until it expires")
        }
        Err(err) => tracing::warn!(error = %err, "Failed to revoke admin token"),
    }

    tracing::info!(admin_id = current.admin.id, "Admin logged out");
    Ok(StatusCode::NO_CONTENT)
}

async fn me(current: CurrentAdmin) -> Json<AdminResponse> {
    Json(AdminResponse::from_db(current.admin))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn login_me_and_logout() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": "admin", "password": "admin-pass" })),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["admin"]["username"], "admin");
        let token = body["access_token"].as_str().expect("token").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["username"], "admin");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/logout",
                Some(&token),
                None,
            ))
            .await
            .expect("logout");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = ctx
            .app
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("me after logout");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;

        for (username, password) in [("admin", "nope"), ("ghost", "admin-pass"), ("", "")] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({ "username": username, "password": password })),
                ))
                .await
                .expect("login");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = test_support::read_json(response).await;
            assert_eq!(body["detail"], "Invalid credentials!");
        }
    }

    #[tokio::test]
    async fn login_attempts_are_rate_limited() {
        let ctx = test_support::setup_test_context().await;

        let mut last = StatusCode::OK;
        for _ in 0..=super::LOGIN_RATE_LIMIT {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({ "username": "admin", "password": "guess" })),
                ))
                .await
                .expect("login");
            last = response.status();
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
