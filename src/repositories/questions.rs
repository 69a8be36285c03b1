use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::QuizType;

const COLUMNS: &str =
    "id, quiz_type, question, option1, option2, option3, option4, answer, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) quiz_type: QuizType,
    pub(crate) question: &'a str,
    pub(crate) options: [&'a str; 4],
    pub(crate) answer: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    let [option1, option2, option3, option4] = params.options;
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (quiz_type, question, option1, option2, option3, option4, answer, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.quiz_type)
    .bind(params.question)
    .bind(option1)
    .bind(option2)
    .bind(option3)
    .bind(option4)
    .bind(params.answer)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    quiz_type: Option<QuizType>,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions"));
    if let Some(quiz_type) = quiz_type {
        builder.push(" WHERE quiz_type = ");
        builder.push_bind(quiz_type);
    }
    builder.push(" ORDER BY id ASC");

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) async fn list_ids_by_type(
    pool: &PgPool,
    quiz_type: QuizType,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE quiz_type = $1 ORDER BY id")
        .bind(quiz_type)
        .fetch_all(pool)
        .await
}

/// Rows for `ids`, in no particular order; deleted ids are simply absent.
pub(crate) async fn find_by_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[i64],
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub(crate) async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
