use std::io::Cursor;

use axum::http::{header, Method, StatusCode};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::db::types::QuizType;
use crate::repositories;
use crate::repositories::results::CreateResult;
use crate::test_support;

async fn record(pool: &sqlx::PgPool, lotname: &str, quiz_type: QuizType, score: i32, secs: i64) {
    let team = match repositories::teams::find_by_lotname(pool, lotname).await.expect("lookup") {
        Some(team) => team,
        None => test_support::insert_team(pool, lotname).await,
    };
    let inserted = repositories::results::create(
        pool,
        CreateResult {
            team_id: team.id,
            session_id: None,
            score,
            duration_seconds: secs,
            quiz_type,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert result");
    assert!(inserted);
}

#[tokio::test]
async fn results_are_ranked_and_paged() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;
    let token = test_support::admin_token(admin.id, ctx.state.settings());
    let pool = ctx.state.db();

    record(pool, "ZETA", QuizType::Tech, 8, 600).await;
    record(pool, "ALPHA", QuizType::Tech, 8, 600).await;
    record(pool, "BRAVO", QuizType::Tech, 8, 420).await;
    record(pool, "CHARLIE", QuizType::Tech, 9, 1_500).await;
    record(pool, "ALPHA", QuizType::Software, 10, 60).await;
    for n in 0..8 {
        record(pool, &format!("TAIL-{n}"), QuizType::Tech, 1, 100 + n).await;
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/results?quiz_type=Tech",
            Some(&token),
            None,
        ))
        .await
        .expect("results");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 12);
    assert_eq!(body["total_pages"], 2);
    let order: Vec<&str> = body["items"]
        .as_array()
        .expect("items")
        .iter()
        .take(4)
        .map(|row| row["lotname"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(order, vec!["CHARLIE", "BRAVO", "ALPHA", "ZETA"]);
    assert_eq!(body["items"][0]["duration"], "00:25:00");
    assert_eq!(body["items"][0]["duration_seconds"], 1_500);
    assert_eq!(body["top_teams"].as_array().map(Vec::len), Some(5));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/results?search=alp",
            Some(&token),
            None,
        ))
        .await
        .expect("search");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["items"][0]["quiz_type"], "Software");
    // The leader board ignores the search box.
    assert_eq!(body["top_teams"][0]["lotname"], "ALPHA");
    assert_eq!(body["top_teams"][1]["lotname"], "CHARLIE");
    assert_eq!(body["top_teams"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn excel_export_contains_every_matching_row() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;
    let token = test_support::admin_token(admin.id, ctx.state.settings());
    for n in 0..12 {
        record(ctx.state.db(), &format!("LOT-{n:02}"), QuizType::Software, n as i32, 300).await;
    }
    record(ctx.state.db(), "TECH-ONLY", QuizType::Tech, 10, 300).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/results?quiz_type=Software&format=excel",
            Some(&token),
            None,
        ))
        .await
        .expect("export");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=results_software.xlsx"
    );

    let bytes = test_support::read_bytes(response).await;
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("xlsx");
    let range = workbook.worksheet_range("Results").expect("Results sheet");
    assert_eq!(range.get_size(), (13, 3));
    assert_eq!(range.get_value((0, 2)), Some(&Data::String("duration".to_string())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("LOT-11".to_string())));
    assert_eq!(range.get_value((1, 2)), Some(&Data::String("00:05:00".to_string())));
}

#[tokio::test]
async fn word_export_is_an_attachment() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;
    let token = test_support::admin_token(admin.id, ctx.state.settings());
    record(ctx.state.db(), "LOT-1", QuizType::Tech, 7, 300).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/results?format=word",
            Some(&token),
            None,
        ))
        .await
        .expect("export");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=top_5_teams_all.docx"
    );
    let bytes = test_support::read_bytes(response).await;
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn deleting_a_team_removes_its_results() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin", "admin-pass").await;
    let token = test_support::admin_token(admin.id, ctx.state.settings());
    record(ctx.state.db(), "GONE", QuizType::Tech, 7, 300).await;
    let team = repositories::teams::find_by_lotname(ctx.state.db(), "GONE")
        .await
        .expect("lookup")
        .expect("team");

    assert!(repositories::teams::delete(ctx.state.db(), team.id).await.expect("delete"));

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/results", Some(&token), None))
        .await
        .expect("results");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["top_teams"], serde_json::json!([]));
}
