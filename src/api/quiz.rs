use std::collections::HashMap;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::api::auth::{LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeam;
use crate::core::metrics::QUIZ_ATTEMPTS_STARTED;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{elapsed_seconds, format_hms, format_primitive, primitive_now_utc};
use crate::db::models::{Question, QuizSession};
use crate::db::types::{AttemptStatus, QuizSessionStatus};
use crate::repositories;
use crate::repositories::quiz_sessions::CreateSession;
use crate::schemas::quiz::{
    AnswersPayload, AutosaveResponse, QuizLogin, QuizQuestion, QuizResultResponse,
    QuizSessionResponse, QuizTokenResponse, SubmitResponse, TabSwitchResponse,
};
use crate::services::quiz_finalize::{self, FinalizeOutcome};
use crate::services::scoring;

const INVALID_ENTRY_CODE: &str = "Invalid Entry Code!";
const INVALID_TEAM_LOGIN: &str = "Invalid Lot Name, Password, or quiz already attempted!";
const NOT_LOGGED_IN: &str = "Not logged in";
const TIME_IS_OVER: &str = "Quiz time is over";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/start", post(start))
        .route("/answers", put(save_answers))
        .route("/tab-switch", post(tab_switch))
        .route("/submit", post(submit))
        .route("/result", get(result))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<QuizLogin>,
) -> Result<Json<QuizTokenResponse>, ApiError> {
    payload.validate().map_err(|_| ApiError::Unauthorized(INVALID_ENTRY_CODE))?;
    let lotname = payload.lotname.trim();

    let rate_key = format!("rl:quiz-login:{lotname}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let entry_code = repositories::entry_codes::find_by_code(state.db(), payload.entry_code.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check entry code"))?
        .ok_or(ApiError::Unauthorized(INVALID_ENTRY_CODE))?;
    let quiz_type = entry_code.quiz_type;

    let team = repositories::teams::find_by_lotname(state.db(), lotname)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load team"))?
        .ok_or(ApiError::Unauthorized(INVALID_TEAM_LOGIN))?;

    let verified = security::verify_password(&payload.password, &team.hashed_password)
        .map_err(|_| ApiError::Unauthorized(INVALID_TEAM_LOGIN))?;
    if !verified || team.status_for(quiz_type) == AttemptStatus::Attempted {
        tracing::info!(%lotname, %quiz_type, "Rejected quiz login");
        return Err(ApiError::Unauthorized(INVALID_TEAM_LOGIN));
    }

    let token = security::create_team_token(team.id, quiz_type, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(team_id = team.id, %quiz_type, "Team logged in for quiz");
    Ok(Json(QuizTokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        lotname: team.lotname,
        quiz_type,
    }))
}

async fn start(
    current: CurrentTeam,
    State(state): State<AppState>,
) -> Result<Json<QuizSessionResponse>, ApiError> {
    if current.team.status_for(current.quiz_type) == AttemptStatus::Attempted {
        return Err(ApiError::Forbidden("Quiz already attempted!"));
    }

    let session = match active_session(&state, &current).await? {
        Some(session) => session,
        None => open_session(&state, &current).await?,
    };

    let questions = repositories::questions::find_by_ids(state.db(), &session.question_ids.0)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;

    let submit_deadline = session.expires_at + state.settings().quiz().submit_grace();
    let token = security::create_session_token(
        current.team.id,
        current.quiz_type,
        submit_deadline.assume_utc(),
        state.settings(),
    )
    .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(session_response(&session, questions, token, primitive_now_utc())))
}

async fn open_session(state: &AppState, current: &CurrentTeam) -> Result<QuizSession, ApiError> {
    let bank = repositories::questions::list_ids_by_type(state.db(), current.quiz_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question bank"))?;
    if bank.is_empty() {
        return Err(ApiError::NotFound("No questions available for this quiz type!".to_string()));
    }

    let count = state.settings().quiz().questions_per_attempt as usize;
    let question_ids = scoring::draw_question_ids(bank, count, &mut rand::thread_rng());

    let session_id = Uuid::new_v4().to_string();
    let started_at = primitive_now_utc();
    let created = repositories::quiz_sessions::create(
        state.db(),
        CreateSession {
            id: &session_id,
            team_id: current.team.id,
            quiz_type: current.quiz_type,
            question_ids: &question_ids,
            started_at,
            expires_at: started_at + state.settings().quiz().time_limit(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz session"))?;

    if created {
        metrics::counter!(QUIZ_ATTEMPTS_STARTED, "quiz_type" => current.quiz_type.as_str())
            .increment(1);
        tracing::info!(
            session_id = %session_id,
            team_id = current.team.id,
            quiz_type = %current.quiz_type,
            questions = question_ids.len(),
            "Quiz session started"
        );
    }

    // A concurrent start may have won the race; either way the active row is the answer.
    active_session(state, current)
        .await?
        .ok_or_else(|| ApiError::internal("active session missing after insert", "Failed to start quiz"))
}

async fn save_answers(
    current: CurrentTeam,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<AutosaveResponse>, ApiError> {
    let session = active_session(&state, &current).await?.ok_or(ApiError::Forbidden(NOT_LOGGED_IN))?;
    let now = primitive_now_utc();
    ensure_before_deadline(&state, &session, now)?;

    let merged = scoring::merge_answers(&session.answers.0, &payload.answers, &session.question_ids.0);
    let saved = repositories::quiz_sessions::save_answers(state.db(), &session.id, &merged, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save answers"))?;
    if !saved {
        return Err(ApiError::Forbidden(NOT_LOGGED_IN));
    }

    Ok(Json(AutosaveResponse { saved: merged.len() }))
}

async fn tab_switch(
    current: CurrentTeam,
    State(state): State<AppState>,
) -> Result<Json<TabSwitchResponse>, ApiError> {
    let Some(session) = active_session(&state, &current).await? else {
        return Ok(Json(TabSwitchResponse { auto_submit: false }));
    };

    let max_switches = state.settings().quiz().max_tab_switches as i32;
    let switch_state = repositories::quiz_sessions::register_tab_switch(
        state.db(),
        &session.id,
        max_switches,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record tab switch"))?;

    let Some(switch_state) = switch_state else {
        return Ok(Json(TabSwitchResponse { auto_submit: false }));
    };

    tracing::warn!(
        session_id = %session.id,
        team_id = current.team.id,
        tab_switches = switch_state.tab_switches,
        "Participant left the quiz tab"
    );
    Ok(Json(TabSwitchResponse { auto_submit: switch_state.just_flagged(max_switches) }))
}

async fn submit(
    current: CurrentTeam,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Some(session) = active_session(&state, &current).await? else {
        return Err(if has_result(&state, &current).await? {
            already_submitted()
        } else {
            ApiError::Forbidden(NOT_LOGGED_IN)
        });
    };

    let now = primitive_now_utc();
    ensure_before_deadline(&state, &session, now)?;

    let answers = scoring::merge_answers(&session.answers.0, &payload.answers, &session.question_ids.0);
    let duration_seconds =
        scoring::capped_duration(session.started_at, now, state.settings().quiz().time_limit());

    let outcome = quiz_finalize::finalize_session(
        state.db(),
        &session,
        &answers,
        QuizSessionStatus::Submitted,
        duration_seconds,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to submit quiz"))?;

    match outcome {
        FinalizeOutcome::Finalized { duration_seconds, .. } => {
            Ok(Json(SubmitResponse { completed: true, duration: format_hms(duration_seconds) }))
        }
        FinalizeOutcome::AlreadyClosed => Err(already_submitted()),
    }
}

async fn result(current: CurrentTeam, State(state): State<AppState>) -> Result<Response, ApiError> {
    if !has_result(&state, &current).await? {
        return Err(ApiError::BadRequest("Please complete the quiz first!".to_string()));
    }

    let mut response =
        Json(QuizResultResponse { completed: true, quiz_type: current.quiz_type }).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}

async fn active_session(
    state: &AppState,
    current: &CurrentTeam,
) -> Result<Option<QuizSession>, ApiError> {
    repositories::quiz_sessions::find_active(state.db(), current.team.id, current.quiz_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz session"))
}

async fn has_result(state: &AppState, current: &CurrentTeam) -> Result<bool, ApiError> {
    repositories::results::exists_for_team(state.db(), current.team.id, current.quiz_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check quiz result"))
}

fn already_submitted() -> ApiError {
    ApiError::Conflict("Quiz already submitted!".to_string())
}

fn ensure_before_deadline(
    state: &AppState,
    session: &QuizSession,
    now: PrimitiveDateTime,
) -> Result<(), ApiError> {
    if now > session.expires_at + state.settings().quiz().submit_grace() {
        return Err(ApiError::BadRequest(TIME_IS_OVER.to_string()));
    }
    Ok(())
}

/// Questions come back in the order they were drawn, stripped of their answers.
fn session_response(
    session: &QuizSession,
    questions: Vec<Question>,
    access_token: String,
    now: PrimitiveDateTime,
) -> QuizSessionResponse {
    let mut by_id: HashMap<i64, Question> =
        questions.into_iter().map(|question| (question.id, question)).collect();
    let questions = session
        .question_ids
        .0
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(|question| QuizQuestion {
            id: question.id,
            question: question.question,
            options: [question.option1, question.option2, question.option3, question.option4],
        })
        .collect();

    let answers = session
        .answers
        .0
        .iter()
        .filter_map(|(id, value)| value.as_str().map(|answer| (id.clone(), answer.to_string())))
        .collect();

    let remaining_seconds = elapsed_seconds(now, session.expires_at);

    QuizSessionResponse {
        session_id: session.id.clone(),
        access_token,
        quiz_type: session.quiz_type,
        started_at: format_primitive(session.started_at),
        expires_at: format_primitive(session.expires_at),
        remaining_seconds,
        questions,
        answers,
    }
}
