use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Team;
use crate::db::types::AttemptStatus;

/// Body of both create and rename requests.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeamPayload {
    #[serde(default)]
    #[validate(length(max = 100, message = "Lot Name must be at most 100 characters!"))]
    pub(crate) lotname: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeamResponse {
    pub(crate) id: i64,
    pub(crate) lotname: String,
    pub(crate) tech_status: AttemptStatus,
    pub(crate) software_status: AttemptStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TeamResponse {
    pub(crate) fn from_db(team: Team) -> Self {
        Self {
            id: team.id,
            lotname: team.lotname,
            tech_status: team.tech_status,
            software_status: team.software_status,
            created_at: format_primitive(team.created_at),
            updated_at: format_primitive(team.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamListQuery {
    #[serde(default)]
    pub(crate) page: Option<i64>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) quiz_type: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct TeamSyncResponse {
    pub(crate) added: usize,
    pub(crate) skipped: usize,
}
