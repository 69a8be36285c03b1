use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::db::types::QuizType;

/// Fields arrive as free text; trimming and checks happen in the handler so that
/// the same rules apply to spreadsheet rows.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuestionCreate {
    #[serde(default)]
    pub(crate) quiz_type: String,
    #[serde(default)]
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) option1: String,
    #[serde(default)]
    pub(crate) option2: String,
    #[serde(default)]
    pub(crate) option3: String,
    #[serde(default)]
    pub(crate) option4: String,
    #[serde(default)]
    pub(crate) answer: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) question: String,
    pub(crate) option1: String,
    pub(crate) option2: String,
    pub(crate) option3: String,
    pub(crate) option4: String,
    pub(crate) answer: String,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            quiz_type: question.quiz_type,
            question: question.question,
            option1: question.option1,
            option2: question.option2,
            option3: question.option3,
            option4: question.option4,
            answer: question.answer,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionListQuery {
    #[serde(default)]
    pub(crate) quiz_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionImportResponse {
    pub(crate) inserted: usize,
    pub(crate) errors: Vec<String>,
}
