use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::EntryCode;
use crate::db::types::QuizType;

const COLUMNS: &str = "id, entry_code, quiz_type, created_at";

pub(crate) async fn find_by_code(
    pool: &PgPool,
    entry_code: &str,
) -> Result<Option<EntryCode>, sqlx::Error> {
    sqlx::query_as::<_, EntryCode>(&format!(
        "SELECT {COLUMNS} FROM entry_codes WHERE entry_code = $1"
    ))
    .bind(entry_code)
    .fetch_optional(pool)
    .await
}

/// `None` when the code already exists.
pub(crate) async fn create(
    pool: &PgPool,
    entry_code: &str,
    quiz_type: QuizType,
    now: PrimitiveDateTime,
) -> Result<Option<EntryCode>, sqlx::Error> {
    sqlx::query_as::<_, EntryCode>(&format!(
        "INSERT INTO entry_codes (entry_code, quiz_type, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (entry_code) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(entry_code)
    .bind(quiz_type)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<EntryCode>, sqlx::Error> {
    sqlx::query_as::<_, EntryCode>(&format!(
        "SELECT {COLUMNS} FROM entry_codes ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM entry_codes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
