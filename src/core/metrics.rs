use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const QUIZ_ATTEMPTS_STARTED: &str = "quiz_attempts_started_total";
pub(crate) const QUIZ_ATTEMPTS_SUBMITTED: &str = "quiz_attempts_submitted_total";
pub(crate) const QUIZ_SESSIONS_EXPIRED: &str = "quiz_sessions_expired_total";

static EXPORTER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder once per process. A no-op when the exporter is disabled.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || EXPORTER.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    if EXPORTER.set(handle).is_ok() {
        describe();
    }
    Ok(())
}

fn describe() {
    describe_counter!("http_requests_total", "HTTP responses by status code");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "Request latency by status code"
    );
    describe_counter!(QUIZ_ATTEMPTS_STARTED, "Quiz sessions opened, by quiz type");
    describe_counter!(QUIZ_ATTEMPTS_SUBMITTED, "Quiz sessions submitted by the team, by quiz type");
    describe_counter!(QUIZ_SESSIONS_EXPIRED, "Overdue sessions closed by the worker, by quiz type");
}

pub(crate) fn render() -> Option<String> {
    EXPORTER.get().map(PrometheusHandle::render)
}
