use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::EntryCode;
use crate::db::types::QuizType;

#[derive(Debug, Deserialize)]
pub(crate) struct EntryCodeCreate {
    #[serde(default)]
    pub(crate) entry_code: String,
    #[serde(default)]
    pub(crate) quiz_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EntryCodeResponse {
    pub(crate) id: i64,
    pub(crate) entry_code: String,
    pub(crate) quiz_type: QuizType,
    pub(crate) created_at: String,
}

impl EntryCodeResponse {
    pub(crate) fn from_db(code: EntryCode) -> Self {
        Self {
            id: code.id,
            entry_code: code.entry_code,
            quiz_type: code.quiz_type,
            created_at: format_primitive(code.created_at),
        }
    }
}
