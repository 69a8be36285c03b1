use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, Claims, TokenKind};
use crate::core::state::AppState;
use crate::db::models::{Admin, Team};
use crate::db::types::QuizType;
use crate::repositories;

const ADMIN_REQUIRED: &str = "Please login as admin first!";
const TEAM_REQUIRED: &str = "Please login first!";

pub(crate) struct CurrentAdmin {
    pub(crate) admin: Admin,
    /// Raw bearer token, kept so logout can revoke it.
    pub(crate) token: String,
    pub(crate) expires_at: i64,
}

pub(crate) struct CurrentTeam {
    pub(crate) team: Team,
    pub(crate) quiz_type: QuizType,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let app_state = app_state(parts, state).await?;
        let (token, claims) =
            authenticate(parts, &app_state, TokenKind::Admin, ADMIN_REQUIRED).await?;

        let admin_id: i64 = claims.sub.parse().map_err(|_| ApiError::Unauthorized(ADMIN_REQUIRED))?;
        let admin = repositories::admins::find_by_id(app_state.db(), admin_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
            .ok_or(ApiError::Unauthorized(ADMIN_REQUIRED))?;

        Ok(CurrentAdmin { admin, token, expires_at: claims.exp })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeam {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let app_state = app_state(parts, state).await?;
        let (_, claims) = authenticate(parts, &app_state, TokenKind::Team, TEAM_REQUIRED).await?;

        let quiz_type = claims.quiz_type.ok_or(ApiError::Unauthorized(TEAM_REQUIRED))?;
        let team_id: i64 = claims.sub.parse().map_err(|_| ApiError::Unauthorized(TEAM_REQUIRED))?;
        let team = repositories::teams::find_by_id(app_state.db(), team_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load team"))?
            .ok_or(ApiError::Unauthorized(TEAM_REQUIRED))?;

        Ok(CurrentTeam { team, quiz_type })
    }
}

async fn app_state(parts: &mut Parts, state: &AppState) -> Result<AppState, ApiError> {
    let State(app_state) = State::<AppState>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;
    Ok(app_state)
}

async fn authenticate(
    parts: &Parts,
    state: &AppState,
    kind: TokenKind,
    rejection: &'static str,
) -> Result<(String, Claims), ApiError> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized(rejection))?;

    let claims = security::verify_token(token, state.settings())
        .map_err(|_| ApiError::Unauthorized(rejection))?;
    if claims.kind != kind {
        return Err(ApiError::Unauthorized(rejection));
    }

    let revoked = state
        .redis()
        .is_token_revoked(&security::token_fingerprint(token))
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Token deny-list lookup failed; accepting token");
            false
        });
    if revoked {
        return Err(ApiError::Unauthorized(rejection));
    }

    Ok((token.to_string(), claims))
}
