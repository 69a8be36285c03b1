use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::QuizSessionStatus;
use crate::repositories;
use crate::services::quiz_finalize::{self, FinalizeOutcome};

const EXPIRE_BATCH_SIZE: i64 = 100;

/// Finalises sessions whose submit window has closed, scoring whatever was autosaved.
/// Returns how many sessions this sweep closed.
pub(crate) async fn expire_overdue_sessions(state: &AppState) -> Result<usize> {
    let now = primitive_now_utc();
    let quiz = state.settings().quiz();
    let cutoff = now - quiz.submit_grace();

    let sessions = repositories::quiz_sessions::list_overdue(state.db(), cutoff, EXPIRE_BATCH_SIZE)
        .await
        .context("Failed to fetch overdue quiz sessions")?;
    if sessions.is_empty() {
        return Ok(0);
    }

    let duration_seconds = quiz.time_limit().whole_seconds();
    let mut expired = 0;

    for session in &sessions {
        let outcome = quiz_finalize::finalize_session(
            state.db(),
            session,
            &session.answers.0,
            QuizSessionStatus::Expired,
            duration_seconds,
            now,
        )
        .await;

        match outcome {
            Ok(FinalizeOutcome::Finalized { .. }) => expired += 1,
            Ok(FinalizeOutcome::AlreadyClosed) => {
                tracing::debug!(session_id = %session.id, "Session closed before expiry sweep");
            }
            Err(err) => {
                tracing::error!(
                    session_id = %session.id,
                    team_id = session.team_id,
                    error = %err,
                    "Failed to expire quiz session"
                );
            }
        }
    }

    tracing::info!(overdue = sessions.len(), expired, "Expired overdue quiz sessions");
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};
    use time::Duration;

    use super::*;
    use crate::db::types::{AttemptStatus, QuizType};
    use crate::repositories::quiz_sessions::CreateSession;
    use crate::repositories::results::StandingFilter;
    use crate::test_support;

    #[tokio::test]
    async fn overdue_sessions_are_scored_from_autosaved_answers() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let team = test_support::insert_team(pool, "LOT-9").await;
        let first = test_support::insert_question(pool, QuizType::Tech, 1).await;
        let second = test_support::insert_question(pool, QuizType::Tech, 2).await;

        let started_at = primitive_now_utc() - Duration::hours(2);
        let question_ids = [first.id, second.id];
        let created = repositories::quiz_sessions::create(
            pool,
            CreateSession {
                id: "overdue-session",
                team_id: team.id,
                quiz_type: QuizType::Tech,
                question_ids: &question_ids,
                started_at,
                expires_at: started_at + Duration::minutes(30),
            },
        )
        .await
        .expect("create session");
        assert!(created);

        let mut answers = Map::new();
        answers.insert(first.id.to_string(), json!("1-B"));
        answers.insert(second.id.to_string(), json!("2-C"));
        repositories::quiz_sessions::save_answers(pool, "overdue-session", &answers, started_at)
            .await
            .expect("autosave");

        assert_eq!(expire_overdue_sessions(&ctx.state).await.expect("sweep"), 1);
        assert_eq!(expire_overdue_sessions(&ctx.state).await.expect("second sweep"), 0);

        let session = test_support::find_session(pool, "overdue-session").await;
        assert_eq!(session.status, QuizSessionStatus::Expired);
        assert_eq!(session.answers.0, answers);

        let standings = repositories::results::list_standings(
            pool,
            &StandingFilter { quiz_type: Some(QuizType::Tech), search: None },
            None,
        )
        .await
        .expect("standings");
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].score, 1);
        assert_eq!(standings[0].duration_seconds, 30 * 60);

        let team = repositories::teams::find_by_id(pool, team.id)
            .await
            .expect("lookup")
            .expect("team");
        assert_eq!(team.tech_status, AttemptStatus::Attempted);
    }

    #[tokio::test]
    async fn sessions_inside_the_grace_period_are_left_alone() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let team = test_support::insert_team(pool, "LOT-10").await;
        let question = test_support::insert_question(pool, QuizType::Software, 1).await;

        // Expired ten seconds ago; the default grace is thirty.
        let expires_at = primitive_now_utc() - Duration::seconds(10);
        repositories::quiz_sessions::create(
            pool,
            CreateSession {
                id: "grace-session",
                team_id: team.id,
                quiz_type: QuizType::Software,
                question_ids: &[question.id],
                started_at: expires_at - Duration::minutes(30),
                expires_at,
            },
        )
        .await
        .expect("create session");

        assert_eq!(expire_overdue_sessions(&ctx.state).await.expect("sweep"), 0);
        let session = repositories::quiz_sessions::find_active(pool, team.id, QuizType::Software)
            .await
            .expect("lookup");
        assert!(session.is_some());
    }
}
