use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Standing;
use crate::db::types::QuizType;
use crate::repositories::like_pattern;

const STANDING_SELECT: &str = "\
    SELECT r.id, r.team_id, t.lotname, r.score, r.duration_seconds, r.quiz_type, r.created_at \
    FROM results r JOIN teams t ON t.id = r.team_id";

const RANKING: &str = " ORDER BY r.score DESC, r.duration_seconds ASC, t.lotname ASC";

pub(crate) struct StandingFilter<'a> {
    pub(crate) quiz_type: Option<QuizType>,
    pub(crate) search: Option<&'a str>,
}

pub(crate) struct CreateResult<'a> {
    pub(crate) team_id: i64,
    pub(crate) session_id: Option<&'a str>,
    pub(crate) score: i32,
    pub(crate) duration_seconds: i64,
    pub(crate) quiz_type: QuizType,
    pub(crate) created_at: PrimitiveDateTime,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &StandingFilter<'_>) {
    builder.push(" WHERE TRUE");
    if let Some(quiz_type) = filter.quiz_type {
        builder.push(" AND r.quiz_type = ");
        builder.push_bind(quiz_type);
    }
    if let Some(search) = filter.search {
        builder.push(" AND t.lotname ILIKE ");
        builder.push_bind(like_pattern(search));
    }
}

/// `false` when the team already has a result for this quiz.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO results (team_id, session_id, score, duration_seconds, quiz_type, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (team_id, quiz_type) DO NOTHING",
    )
    .bind(params.team_id)
    .bind(params.session_id)
    .bind(params.score)
    .bind(params.duration_seconds)
    .bind(params.quiz_type)
    .bind(params.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn exists_for_team(
    pool: &PgPool,
    team_id: i64,
    quiz_type: QuizType,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM results WHERE team_id = $1 AND quiz_type = $2)",
    )
    .bind(team_id)
    .bind(quiz_type)
    .fetch_one(pool)
    .await
}

/// Ranked standings; `page` of `None` returns every matching row.
pub(crate) async fn list_standings(
    pool: &PgPool,
    filter: &StandingFilter<'_>,
    page: Option<(i64, i64)>,
) -> Result<Vec<Standing>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(STANDING_SELECT);
    push_filter(&mut builder, filter);
    builder.push(RANKING);
    if let Some((offset, limit)) = page {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset.max(0));
    }

    builder.build_query_as::<Standing>().fetch_all(pool).await
}

pub(crate) async fn count_standings(
    pool: &PgPool,
    filter: &StandingFilter<'_>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM results r JOIN teams t ON t.id = r.team_id",
    );
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn top_teams(
    pool: &PgPool,
    quiz_type: Option<QuizType>,
    limit: i64,
) -> Result<Vec<Standing>, sqlx::Error> {
    list_standings(pool, &StandingFilter { quiz_type, search: None }, Some((0, limit))).await
}
