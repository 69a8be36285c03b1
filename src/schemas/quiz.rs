use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::QuizType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizLogin {
    #[serde(default)]
    pub(crate) lotname: String,
    #[serde(default)]
    pub(crate) password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Invalid Entry Code!"))]
    pub(crate) entry_code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizTokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) lotname: String,
    pub(crate) quiz_type: QuizType,
}

/// A question as shown to participants; the answer never leaves the server.
#[derive(Debug, Serialize)]
pub(crate) struct QuizQuestion {
    pub(crate) id: i64,
    pub(crate) question: String,
    pub(crate) options: [String; 4],
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSessionResponse {
    pub(crate) session_id: String,
    /// Replaces the login token; valid until the submit window closes.
    pub(crate) access_token: String,
    pub(crate) quiz_type: QuizType,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) remaining_seconds: i64,
    pub(crate) questions: Vec<QuizQuestion>,
    pub(crate) answers: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnswersPayload {
    #[serde(default)]
    pub(crate) answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AutosaveResponse {
    pub(crate) saved: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct TabSwitchResponse {
    pub(crate) auto_submit: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) completed: bool,
    /// `HH:MM:SS`
    pub(crate) duration: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResultResponse {
    pub(crate) completed: bool,
    pub(crate) quiz_type: QuizType,
}
