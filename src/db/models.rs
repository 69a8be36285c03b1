use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, QuizSessionStatus, QuizType};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Admin {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Team {
    pub(crate) id: i64,
    pub(crate) lotname: String,
    pub(crate) hashed_password: String,
    pub(crate) tech_status: AttemptStatus,
    pub(crate) software_status: AttemptStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Team {
    pub(crate) fn status_for(&self, quiz_type: QuizType) -> AttemptStatus {
        match quiz_type {
            QuizType::Tech => self.tech_status,
            QuizType::Software => self.software_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) question: String,
    pub(crate) option1: String,
    pub(crate) option2: String,
    pub(crate) option3: String,
    pub(crate) option4: String,
    pub(crate) answer: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct EntryCode {
    pub(crate) id: i64,
    pub(crate) entry_code: String,
    pub(crate) quiz_type: QuizType,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizSession {
    pub(crate) id: String,
    pub(crate) team_id: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) question_ids: Json<Vec<i64>>,
    pub(crate) answers: Json<serde_json::Map<String, serde_json::Value>>,
    pub(crate) tab_switches: i32,
    pub(crate) auto_submit_requested: bool,
    pub(crate) status: QuizSessionStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A result row joined with the team's current lot name.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Standing {
    pub(crate) id: i64,
    pub(crate) team_id: i64,
    pub(crate) lotname: String,
    pub(crate) score: i32,
    pub(crate) duration_seconds: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) created_at: PrimitiveDateTime,
}
