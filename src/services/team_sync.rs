use std::collections::HashSet;

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::team::TeamSyncResponse;

/// Keys probed, in order, when the feed wraps its list in an object.
const LIST_KEYS: [&str; 4] = ["data", "teams", "lots", "records"];

#[derive(Debug, Error)]
pub(crate) enum SyncError {
    #[error("Error fetching data from URL: {0}")]
    Fetch(String),
    #[error("Invalid JSON data from URL: {0}")]
    InvalidJson(String),
    #[error("No valid team data found in response!")]
    Empty,
    #[error("failed to hash team password")]
    Hashing(#[from] security::SecurityError),
    #[error("password hashing task failed: {0}")]
    HashingTask(#[from] tokio::task::JoinError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub(crate) async fn fetch_payload(http: &reqwest::Client, url: &str) -> Result<Value, SyncError> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| SyncError::Fetch(err.to_string()))?;
    let body = response.bytes().await.map_err(|err| SyncError::Fetch(err.to_string()))?;

    serde_json::from_slice(&body).map_err(|err| SyncError::InvalidJson(err.to_string()))
}

/// One entry per element of the feed; `None` marks an element without a usable lot name.
pub(crate) fn parse_entries(payload: &Value) -> Result<Vec<Option<String>>, SyncError> {
    let single;
    let items: &[Value] = match payload {
        Value::Array(items) => items,
        Value::Object(map) => {
            match LIST_KEYS.iter().find_map(|key| map.get(*key).and_then(Value::as_array)) {
                Some(items) => items,
                None => {
                    single = [payload.clone()];
                    &single
                }
            }
        }
        _ => return Err(SyncError::Empty),
    };

    if items.is_empty() {
        return Err(SyncError::Empty);
    }

    Ok(items.iter().map(lotname_of).collect())
}

fn lotname_of(item: &Value) -> Option<String> {
    let raw = match item.get("lotname")? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// Inserts every new lot name; invalid, empty and duplicate entries count as skipped.
pub(crate) async fn import_entries(
    pool: &PgPool,
    entries: Vec<Option<String>>,
    password_suffix: &str,
) -> Result<TeamSyncResponse, SyncError> {
    let known: HashSet<String> =
        repositories::teams::list_lotnames(pool).await?.into_iter().collect();
    let (fresh, mut skipped) = new_lotnames(entries, known);

    // argon2 is CPU bound; hash the whole batch off the runtime before opening the transaction.
    let suffix = password_suffix.to_string();
    let hashed = tokio::task::spawn_blocking(move || {
        fresh
            .into_iter()
            .map(|lotname| {
                let hash = security::hash_password(&security::team_password(&lotname, &suffix))?;
                Ok((lotname, hash))
            })
            .collect::<Result<Vec<_>, security::SecurityError>>()
    })
    .await??;

    let now = primitive_now_utc();
    let mut added = 0;
    let mut tx = pool.begin().await?;
    for (lotname, hash) in &hashed {
        match repositories::teams::create(&mut *tx, lotname, hash, now).await? {
            Some(_) => added += 1,
            None => skipped += 1,
        }
    }
    tx.commit().await?;

    Ok(TeamSyncResponse { added, skipped })
}

/// Splits the feed into lot names to create and a count of skipped entries.
fn new_lotnames(entries: Vec<Option<String>>, mut known: HashSet<String>) -> (Vec<String>, usize) {
    let mut fresh = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        match entry {
            Some(lotname) if lotname.chars().count() <= 100 && !known.contains(&lotname) => {
                known.insert(lotname.clone());
                fresh.push(lotname);
            }
            _ => skipped += 1,
        }
    }
    (fresh, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_list_is_accepted() {
        let entries = parse_entries(&json!([{"lotname": " LOT1 "}, {"lotname": 42}])).unwrap();
        assert_eq!(entries, vec![Some("LOT1".to_string()), Some("42".to_string())]);
    }

    #[test]
    fn first_list_valued_key_wins() {
        let payload = json!({
            "data": "not a list",
            "teams": [{"lotname": "A"}],
            "lots": [{"lotname": "B"}]
        });
        assert_eq!(parse_entries(&payload).unwrap(), vec![Some("A".to_string())]);
    }

    #[test]
    fn bare_object_is_a_single_entry() {
        let entries = parse_entries(&json!({"lotname": "SOLO"})).unwrap();
        assert_eq!(entries, vec![Some("SOLO".to_string())]);

        let entries = parse_entries(&json!({"status": "ok"})).unwrap();
        assert_eq!(entries, vec![None]);
    }

    #[test]
    fn invalid_elements_become_none() {
        let entries =
            parse_entries(&json!(["LOT", {"name": "x"}, {"lotname": "  "}, {"lotname": null}]))
                .unwrap();
        assert_eq!(entries, vec![None, None, None, None]);
    }

    #[test]
    fn empty_payloads_are_rejected() {
        assert!(matches!(parse_entries(&json!([])), Err(SyncError::Empty)));
        assert!(matches!(parse_entries(&json!({"records": []})), Err(SyncError::Empty)));
        assert!(matches!(parse_entries(&json!("text")), Err(SyncError::Empty)));
    }

    #[test]
    fn known_invalid_and_repeated_names_are_skipped() {
        let known = HashSet::from(["OLD".to_string()]);
        let entries = vec![
            Some("NEW".to_string()),
            Some("OLD".to_string()),
            None,
            Some("NEW".to_string()),
            Some("L".repeat(101)),
            Some("OTHER".to_string()),
        ];

        let (fresh, skipped) = new_lotnames(entries, known);

        assert_eq!(fresh, vec!["NEW".to_string(), "OTHER".to_string()]);
        assert_eq!(skipped, 4);
    }

    #[test]
    fn error_messages_match_admin_feedback() {
        assert_eq!(
            SyncError::Fetch("timeout".to_string()).to_string(),
            "Error fetching data from URL: timeout"
        );
        assert_eq!(SyncError::Empty.to_string(), "No valid team data found in response!");
    }
}
