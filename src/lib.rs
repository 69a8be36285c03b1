pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::future::Future;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};

/// Shared startup of the API server and the worker: configuration, logging, Postgres with
/// migrations applied, and a best-effort Redis connection.
async fn bootstrap_state() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().url());
    match redis.connect().await {
        Ok(()) => tracing::info!("Redis connected"),
        Err(err) => tracing::error!(
            error = %err,
            "Redis unavailable; login throttling and logout revocation are disabled"
        ),
    }

    Ok(AppState::new(settings, db_pool, redis))
}

/// Runs `work` to completion, then releases the Redis connection whatever the outcome.
async fn with_redis<F>(state: &AppState, work: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let result = work.await;
    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");
    result
}

pub async fn run() -> anyhow::Result<()> {
    let state = bootstrap_state().await?;

    if let Err(err) = core::bootstrap::ensure_first_admin(&state).await {
        tracing::error!(error = %err, "Failed to ensure first admin account");
    }

    let server = state.settings().server().clone();
    let listener = tokio::net::TcpListener::bind(server.addr()).await?;
    tracing::info!(
        host = %server.host,
        port = server.port,
        environment = state.settings().runtime().environment.as_str(),
        "Quizdesk API listening"
    );

    let app = api::router::router(state.clone());
    with_redis(&state, async move {
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;
        Ok::<_, anyhow::Error>(())
    })
    .await
}

pub async fn run_worker() -> anyhow::Result<()> {
    let state = bootstrap_state().await?;
    with_redis(&state, tasks::scheduler::run(state.clone())).await
}
