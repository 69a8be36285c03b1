use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::QuizSession;
use crate::db::types::{QuizSessionStatus, QuizType};

pub(crate) const COLUMNS: &str = "\
    id, team_id, quiz_type, question_ids, answers, tab_switches, auto_submit_requested, \
    status, started_at, expires_at, submitted_at, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) team_id: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) question_ids: &'a [i64],
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub(crate) struct TabSwitchState {
    pub(crate) tab_switches: i32,
    pub(crate) auto_submit_requested: bool,
}

impl TabSwitchState {
    /// True only for the switch that reached the limit; later switches do not re-signal.
    pub(crate) fn just_flagged(&self, max_tab_switches: i32) -> bool {
        self.auto_submit_requested && self.tab_switches == max_tab_switches
    }
}

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    team_id: i64,
    quiz_type: QuizType,
) -> Result<Option<QuizSession>, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {COLUMNS} FROM quiz_sessions \
         WHERE team_id = $1 AND quiz_type = $2 AND status = $3"
    ))
    .bind(team_id)
    .bind(quiz_type)
    .bind(QuizSessionStatus::Active)
    .fetch_optional(executor)
    .await
}

/// Returns `false` when an active session already exists for the team and quiz.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_sessions (
            id, team_id, quiz_type, question_ids, answers, status,
            started_at, expires_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, '{}'::jsonb, $5, $6, $7, $6, $6)
        ON CONFLICT DO NOTHING",
    )
    .bind(session.id)
    .bind(session.team_id)
    .bind(session.quiz_type)
    .bind(Json(session.question_ids))
    .bind(QuizSessionStatus::Active)
    .bind(session.started_at)
    .bind(session.expires_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn save_answers(
    pool: &PgPool,
    id: &str,
    answers: &serde_json::Map<String, serde_json::Value>,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_sessions SET answers = $1, updated_at = $2 WHERE id = $3 AND status = $4",
    )
    .bind(Json(answers))
    .bind(now)
    .bind(id)
    .bind(QuizSessionStatus::Active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn register_tab_switch(
    pool: &PgPool,
    id: &str,
    max_tab_switches: i32,
    now: PrimitiveDateTime,
) -> Result<Option<TabSwitchState>, sqlx::Error> {
    sqlx::query_as::<_, TabSwitchState>(
        "UPDATE quiz_sessions
         SET tab_switches = tab_switches + 1,
             auto_submit_requested = auto_submit_requested OR tab_switches + 1 >= $1,
             updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING tab_switches, auto_submit_requested",
    )
    .bind(max_tab_switches)
    .bind(now)
    .bind(id)
    .bind(QuizSessionStatus::Active)
    .fetch_optional(pool)
    .await
}

/// Moves an active session to `status`; `false` if it was no longer active.
pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: QuizSessionStatus,
    answers: &serde_json::Map<String, serde_json::Value>,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_sessions
         SET status = $1, answers = $2, submitted_at = $3, updated_at = $3
         WHERE id = $4 AND status = $5",
    )
    .bind(status)
    .bind(Json(answers))
    .bind(now)
    .bind(id)
    .bind(QuizSessionStatus::Active)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_overdue(
    pool: &PgPool,
    cutoff: PrimitiveDateTime,
    limit: i64,
) -> Result<Vec<QuizSession>, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {COLUMNS} FROM quiz_sessions \
         WHERE status = $1 AND expires_at < $2 \
         ORDER BY expires_at ASC LIMIT $3"
    ))
    .bind(QuizSessionStatus::Active)
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await
}
