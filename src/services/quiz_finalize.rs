use serde_json::{Map, Value};
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::core::metrics::{QUIZ_ATTEMPTS_SUBMITTED, QUIZ_SESSIONS_EXPIRED};
use crate::db::models::QuizSession;
use crate::db::types::QuizSessionStatus;
use crate::repositories;
use crate::services::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinalizeOutcome {
    Finalized { score: i32, duration_seconds: i64 },
    /// Another submit or the expiry sweep closed the session first.
    AlreadyClosed,
}

/// Scores `answers`, closes the session as `status`, records the result and marks
/// the team as having attempted the quiz, all in one transaction.
pub(crate) async fn finalize_session(
    pool: &PgPool,
    session: &QuizSession,
    answers: &Map<String, Value>,
    status: QuizSessionStatus,
    duration_seconds: i64,
    now: PrimitiveDateTime,
) -> Result<FinalizeOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let closed =
        repositories::quiz_sessions::finalize(&mut *tx, &session.id, status, answers, now).await?;
    if !closed {
        tx.rollback().await?;
        return Ok(FinalizeOutcome::AlreadyClosed);
    }

    let questions = repositories::questions::find_by_ids(&mut *tx, &session.question_ids.0).await?;
    let score = scoring::score(&questions, answers);

    let inserted = repositories::results::create(
        &mut *tx,
        repositories::results::CreateResult {
            team_id: session.team_id,
            session_id: Some(&session.id),
            score,
            duration_seconds,
            quiz_type: session.quiz_type,
            created_at: now,
        },
    )
    .await?;
    if !inserted {
        tracing::warn!(
            session_id = %session.id,
            team_id = session.team_id,
            quiz_type = %session.quiz_type,
            "Team already has a result for this quiz; keeping the earlier one"
        );
    }

    repositories::teams::mark_attempted(&mut *tx, session.team_id, session.quiz_type, now).await?;
    tx.commit().await?;

    let counter = match status {
        QuizSessionStatus::Expired => QUIZ_SESSIONS_EXPIRED,
        _ => QUIZ_ATTEMPTS_SUBMITTED,
    };
    metrics::counter!(counter, "quiz_type" => session.quiz_type.as_str()).increment(1);

    tracing::info!(
        session_id = %session.id,
        team_id = session.team_id,
        quiz_type = %session.quiz_type,
        status = ?status,
        score,
        duration_seconds,
        "Quiz session finalized"
    );

    Ok(FinalizeOutcome::Finalized { score, duration_seconds })
}
