use std::time::Duration;

use axum::{
    body::Body,
    http::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, ORIGIN},
    http::{HeaderName, HeaderValue, Method, Request, Response},
    routing::get,
    Router,
};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::api::{auth, entry_codes, handlers, questions, quiz, results, teams};
use crate::core::state::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub(crate) fn router(state: AppState) -> Router {
    let settings = state.settings();

    let mut app: Router<AppState> = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz).head(handlers::healthz))
        .nest(&settings.api().prefix, versioned_routes());
    if settings.telemetry().prometheus_enabled {
        app = app.route("/metrics", get(handlers::metrics));
    }

    let layered = app
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response)
                .on_failure(|failure: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    tracing::warn!(%failure, "Request failed");
                }),
        )
        .layer(cors_layer(settings.cors_origins()));

    layered.with_state(state)
}

/// Admin panels under `/auth`, `/teams`, `/questions`, `/entry-codes`, `/results`; the
/// participant flow under `/quiz`.
fn versioned_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/teams", teams::router())
        .nest("/questions", questions::router())
        .nest("/entry-codes", entry_codes::router())
        .nest("/results", results::router())
        .nest("/quiz", quiz::router())
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id =
        request.headers().get(&REQUEST_ID).and_then(|value| value.to_str().ok()).unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id
    )
}

fn record_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status().as_u16().to_string();
    metrics::counter!("http_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status)
        .record(latency.as_secs_f64());
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> =
        origins.iter().filter_map(|origin| HeaderValue::from_str(origin).ok()).collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT, ORIGIN, REQUEST_ID])
        // Export downloads read their file name from Content-Disposition.
        .expose_headers([REQUEST_ID, CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        // A wildcard origin cannot be combined with credentials.
        layer.allow_origin(Any)
    } else {
        layer.allow_credentials(true).allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::core::redis::RedisHandle;
    use crate::core::state::AppState;
    use crate::core::{config::Settings, metrics};
    use crate::test_support;

    /// State whose pool never connects; enough for routes that do not touch the database.
    fn offline_state(settings: Settings) -> AppState {
        let db = sqlx::PgPool::connect_lazy(&settings.database().url()).expect("lazy pool");
        let redis = RedisHandle::new(settings.redis().url());
        AppState::new(settings, db, redis)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn root_reports_service_name_and_prefix() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = router(offline_state(Settings::load().expect("settings")));

        let response = app.oneshot(get("/")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["message"], "Quizdesk API");
        assert_eq!(json["api_prefix"], "/api/v1");
    }

    #[tokio::test]
    async fn admin_routes_require_token() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = router(offline_state(Settings::load().expect("settings")));

        for uri in ["/api/v1/teams", "/api/v1/questions", "/api/v1/entry-codes", "/api/v1/results"] {
            let response = app.clone().oneshot(get(uri)).await.expect("response");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let json = test_support::read_json(response).await;
            assert_eq!(json["detail"], "Please login as admin first!");
        }
    }

    #[tokio::test]
    async fn quiz_routes_require_team_token() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = router(offline_state(Settings::load().expect("settings")));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/quiz/start")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = test_support::read_json(response).await;
        assert_eq!(json["detail"], "Please login first!");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = router(offline_state(Settings::load().expect("settings")));

        let response = app.oneshot(get("/")).await.expect("response");

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn metrics_route_follows_setting() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let disabled = router(offline_state(Settings::load().expect("settings")));
        let response = disabled.oneshot(get("/metrics")).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        std::env::set_var("PROMETHEUS_ENABLED", "1");
        let settings = Settings::load().expect("settings");
        std::env::set_var("PROMETHEUS_ENABLED", "0");
        metrics::init(&settings).expect("metrics init");

        let enabled = router(offline_state(settings));
        let response = enabled.oneshot(get("/metrics")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
