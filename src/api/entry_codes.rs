use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::entry_code::{EntryCodeCreate, EntryCodeResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entry_codes).post(create_entry_code))
        .route("/:code_id", delete(delete_entry_code))
}

async fn list_entry_codes(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<EntryCodeResponse>>, ApiError> {
    let codes = repositories::entry_codes::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list entry codes"))?;
    Ok(Json(codes.into_iter().map(EntryCodeResponse::from_db).collect()))
}

async fn create_entry_code(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<EntryCodeCreate>,
) -> Result<(StatusCode, Json<EntryCodeResponse>), ApiError> {
    let entry_code = payload.entry_code.trim();
    if entry_code.is_empty() || payload.quiz_type.trim().is_empty() {
        return Err(ApiError::BadRequest("Entry code and quiz type are required!".to_string()));
    }
    let quiz_type = validation::quiz_type(&payload.quiz_type)?;

    let code = repositories::entry_codes::create(
        state.db(),
        entry_code,
        quiz_type,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create entry code"))?
    .ok_or_else(|| ApiError::Conflict("Entry code already exists!".to_string()))?;

    tracing::info!(code_id = code.id, quiz_type = %code.quiz_type, "Entry code set");
    Ok((StatusCode::CREATED, Json(EntryCodeResponse::from_db(code))))
}

async fn delete_entry_code(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Path(code_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::entry_codes::delete(state.db(), code_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete entry code"))?;
    if !deleted {
        return Err(ApiError::NotFound("Entry code not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
