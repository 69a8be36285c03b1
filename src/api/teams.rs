use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{self, PageResponse, PER_PAGE};
use crate::api::validation;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::teams::TeamListFilter;
use crate::schemas::team::{TeamListQuery, TeamPayload, TeamResponse, TeamSyncResponse};
use crate::services::team_sync::{self, SyncError};

const DUPLICATE_TEAM: &str = "Team name already exists!";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/sync", post(sync_teams))
        .route("/:team_id", get(get_team).put(update_team).delete(delete_team))
}

fn team_not_found() -> ApiError {
    ApiError::NotFound("Team not found".to_string())
}

fn hashed_team_password(state: &AppState, lotname: &str) -> Result<String, ApiError> {
    let password = security::team_password(lotname, &state.settings().quiz().team_password_suffix);
    security::hash_password(&password).map_err(|e| ApiError::internal(e, "Failed to hash password"))
}

async fn list_teams(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<TeamListQuery>,
) -> Result<Json<PageResponse<TeamResponse>>, ApiError> {
    let page = pagination::normalize_page(params.page);
    let filter = TeamListFilter {
        search: validation::search_term(params.search.as_deref()),
        attempted: validation::quiz_type_filter(params.quiz_type.as_deref())?,
    };

    let total_count = repositories::teams::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count teams"))?;
    let teams =
        repositories::teams::list(state.db(), &filter, pagination::offset(page), PER_PAGE)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list teams"))?;

    let items = teams.into_iter().map(TeamResponse::from_db).collect();
    Ok(Json(PageResponse::new(items, page, total_count)))
}

async fn create_team(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TeamPayload>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let lotname = validation::lotname(&payload.lotname)?;
    let hashed = hashed_team_password(&state, &lotname)?;

    let team = repositories::teams::create(state.db(), &lotname, &hashed, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create team"))?
        .ok_or_else(|| ApiError::Conflict(DUPLICATE_TEAM.to_string()))?;

    tracing::info!(team_id = team.id, lotname = %team.lotname, "Team created");
    Ok((StatusCode::CREATED, Json(TeamResponse::from_db(team))))
}

async fn sync_teams(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<TeamSyncResponse>, ApiError> {
    let url = &state.settings().team_sync().url;
    let payload = team_sync::fetch_payload(state.http(), url).await.map_err(sync_error)?;
    let entries = team_sync::parse_entries(&payload).map_err(sync_error)?;

    let summary = team_sync::import_entries(
        state.db(),
        entries,
        &state.settings().quiz().team_password_suffix,
    )
    .await
    .map_err(sync_error)?;

    tracing::info!(added = summary.added, skipped = summary.skipped, "Teams synced");
    Ok(Json(summary))
}

fn sync_error(err: SyncError) -> ApiError {
    match err {
        SyncError::Fetch(_) | SyncError::InvalidJson(_) => ApiError::BadGateway(err.to_string()),
        SyncError::Empty => ApiError::BadRequest(err.to_string()),
        SyncError::Hashing(_) | SyncError::HashingTask(_) | SyncError::Database(_) => {
            ApiError::internal(err, "Failed to import synced teams")
        }
    }
}

async fn get_team(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repositories::teams::find_by_id(state.db(), team_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load team"))?
        .ok_or_else(team_not_found)?;
    Ok(Json(TeamResponse::from_db(team)))
}

async fn update_team(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
    Json(payload): Json<TeamPayload>,
) -> Result<Json<TeamResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let lotname = validation::lotname(&payload.lotname)?;
    let hashed = hashed_team_password(&state, &lotname)?;

    let team = match repositories::teams::rename(
        state.db(),
        team_id,
        &lotname,
        &hashed,
        primitive_now_utc(),
    )
    .await
    {
        Ok(Some(team)) => team,
        Ok(None) => return Err(team_not_found()),
        Err(err) if repositories::is_unique_violation(&err) => {
            return Err(ApiError::Conflict(DUPLICATE_TEAM.to_string()))
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to update team")),
    };

    tracing::info!(team_id = team.id, lotname = %team.lotname, "Team renamed");
    Ok(Json(TeamResponse::from_db(team)))
}

async fn delete_team(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::teams::delete(state.db(), team_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete team"))?;
    if !deleted {
        return Err(team_not_found());
    }

    tracing::info!(team_id, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}
