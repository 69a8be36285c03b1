pub(crate) mod admins;
pub(crate) mod entry_codes;
pub(crate) mod health;
pub(crate) mod questions;
pub(crate) mod quiz_sessions;
pub(crate) mod results;
pub(crate) mod teams;

/// True when `err` is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().and_then(|db_err| db_err.code()).is_some_and(|code| code == "23505")
}

/// Escapes LIKE wildcards so user search text matches literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}
