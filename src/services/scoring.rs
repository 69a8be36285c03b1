use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use time::{Duration, PrimitiveDateTime};

use crate::core::time::elapsed_seconds;
use crate::db::models::Question;

/// Shuffles the bank and keeps the first `count` ids.
pub(crate) fn draw_question_ids<R: Rng + ?Sized>(
    mut bank: Vec<i64>,
    count: usize,
    rng: &mut R,
) -> Vec<i64> {
    bank.shuffle(rng);
    bank.truncate(count);
    bank
}

/// Merges `incoming` over `saved`, dropping ids that are not part of the session.
pub(crate) fn merge_answers(
    saved: &Map<String, Value>,
    incoming: &HashMap<String, String>,
    question_ids: &[i64],
) -> Map<String, Value> {
    let mut merged = Map::new();
    for id in question_ids {
        let key = id.to_string();
        let value = incoming
            .get(&key)
            .map(|answer| answer.trim().to_string())
            .or_else(|| saved.get(&key).and_then(Value::as_str).map(str::to_string));
        if let Some(value) = value {
            merged.insert(key, Value::String(value));
        }
    }
    merged
}

/// Number of questions whose chosen option equals the stored answer.
pub(crate) fn score(questions: &[Question], answers: &Map<String, Value>) -> i32 {
    questions
        .iter()
        .filter(|question| {
            answers
                .get(&question.id.to_string())
                .and_then(Value::as_str)
                .is_some_and(|chosen| chosen.trim() == question.answer.trim())
        })
        .count() as i32
}

pub(crate) fn capped_duration(
    started_at: PrimitiveDateTime,
    now: PrimitiveDateTime,
    time_limit: Duration,
) -> i64 {
    elapsed_seconds(started_at, now).min(time_limit.whole_seconds())
}
