use serde::{Deserialize, Serialize};

use crate::api::pagination::PageResponse;
use crate::core::time::{format_hms, format_primitive};
use crate::db::models::Standing;
use crate::db::types::QuizType;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ExportFormat {
    #[default]
    Json,
    Excel,
    Word,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultListQuery {
    #[serde(default)]
    pub(crate) page: Option<i64>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) quiz_type: Option<String>,
    #[serde(default)]
    pub(crate) format: ExportFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultRow {
    pub(crate) id: i64,
    pub(crate) team_id: i64,
    pub(crate) lotname: String,
    pub(crate) score: i32,
    /// `HH:MM:SS`
    pub(crate) duration: String,
    pub(crate) duration_seconds: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) submitted_at: String,
}

impl ResultRow {
    pub(crate) fn from_db(standing: Standing) -> Self {
        Self {
            id: standing.id,
            team_id: standing.team_id,
            lotname: standing.lotname,
            score: standing.score,
            duration: format_hms(standing.duration_seconds),
            duration_seconds: standing.duration_seconds,
            quiz_type: standing.quiz_type,
            submitted_at: format_primitive(standing.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultsResponse {
    #[serde(flatten)]
    pub(crate) page: PageResponse<ResultRow>,
    pub(crate) top_teams: Vec<ResultRow>,
}
