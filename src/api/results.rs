use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{self, PageResponse, PER_PAGE};
use crate::api::validation;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::results::StandingFilter;
use crate::schemas::result::{ExportFormat, ResultListQuery, ResultRow, ResultsResponse};
use crate::services::result_export;

const TOP_TEAMS: i64 = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_results))
}

async fn list_results(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<ResultListQuery>,
) -> Result<Response, ApiError> {
    let quiz_type = validation::quiz_type_filter(params.quiz_type.as_deref())?;
    let filter = StandingFilter {
        quiz_type,
        search: validation::search_term(params.search.as_deref()),
    };

    match params.format {
        ExportFormat::Json => {
            let page = pagination::normalize_page(params.page);
            let total_count = repositories::results::count_standings(state.db(), &filter)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count results"))?;
            let rows = repositories::results::list_standings(
                state.db(),
                &filter,
                Some((pagination::offset(page), PER_PAGE)),
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
            let top_teams = top_teams(&state, quiz_type).await?;

            let items = rows.into_iter().map(ResultRow::from_db).collect();
            Ok(Json(ResultsResponse { page: PageResponse::new(items, page, total_count), top_teams })
                .into_response())
        }
        ExportFormat::Excel => {
            let rows = repositories::results::list_standings(state.db(), &filter, None)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
            let rows: Vec<ResultRow> = rows.into_iter().map(ResultRow::from_db).collect();
            let bytes = result_export::results_workbook(&rows)
                .map_err(|e| ApiError::internal(e, "Failed to build results spreadsheet"))?;

            attachment(
                bytes,
                result_export::XLSX_CONTENT_TYPE,
                &result_export::results_filename(quiz_type),
            )
        }
        ExportFormat::Word => {
            let rows = top_teams(&state, quiz_type).await?;
            let bytes = result_export::top_teams_document(quiz_type, &rows)
                .map_err(|e| ApiError::internal(e, "Failed to build top teams document"))?;

            attachment(
                bytes,
                result_export::DOCX_CONTENT_TYPE,
                &result_export::top_teams_filename(quiz_type),
            )
        }
    }
}

/// Leaders for the quiz-type scope; the search box never narrows this list.
async fn top_teams(
    state: &AppState,
    quiz_type: Option<crate::db::types::QuizType>,
) -> Result<Vec<ResultRow>, ApiError> {
    let rows = repositories::results::top_teams(state.db(), quiz_type, TOP_TEAMS)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load top teams"))?;
    Ok(rows.into_iter().map(ResultRow::from_db).collect())
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={filename}"))
        .map_err(|e| ApiError::internal(e, "Failed to build download headers"))?;

    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

#[cfg(test)]
mod tests;
