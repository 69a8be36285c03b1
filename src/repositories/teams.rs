use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Team;
use crate::db::types::{AttemptStatus, QuizType};
use crate::repositories::like_pattern;

const COLUMNS: &str =
    "id, lotname, hashed_password, tech_status, software_status, created_at, updated_at";

pub(crate) struct TeamListFilter<'a> {
    pub(crate) search: Option<&'a str>,
    /// Keep only teams that already took this quiz.
    pub(crate) attempted: Option<QuizType>,
}

fn status_column(quiz_type: QuizType) -> &'static str {
    match quiz_type {
        QuizType::Tech => "tech_status",
        QuizType::Software => "software_status",
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TeamListFilter<'_>) {
    builder.push(" WHERE TRUE");
    if let Some(search) = filter.search {
        builder.push(" AND lotname ILIKE ");
        builder.push_bind(like_pattern(search));
    }
    if let Some(quiz_type) = filter.attempted {
        builder.push(format!(" AND {} <> ", status_column(quiz_type)));
        builder.push_bind(AttemptStatus::NotAttempted);
    }
}

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!("SELECT {COLUMNS} FROM teams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_lotname(
    pool: &PgPool,
    lotname: &str,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!("SELECT {COLUMNS} FROM teams WHERE lotname = $1"))
        .bind(lotname)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_lotnames(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT lotname FROM teams").fetch_all(pool).await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &TeamListFilter<'_>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Team>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM teams"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY lotname ASC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset.max(0));

    builder.build_query_as::<Team>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &TeamListFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM teams");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Inserts a team; `None` means the lot name is already taken.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    lotname: &str,
    hashed_password: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        "INSERT INTO teams (lotname, hashed_password, tech_status, software_status, created_at, updated_at)
         VALUES ($1, $2, $3, $3, $4, $4)
         ON CONFLICT (lotname) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(lotname)
    .bind(hashed_password)
    .bind(AttemptStatus::NotAttempted)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn rename(
    pool: &PgPool,
    id: i64,
    lotname: &str,
    hashed_password: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        "UPDATE teams SET lotname = $1, hashed_password = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(lotname)
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn mark_attempted(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    quiz_type: QuizType,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE teams SET {} = $1, updated_at = $2 WHERE id = $3",
        status_column(quiz_type)
    ))
    .bind(AttemptStatus::Attempted)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
