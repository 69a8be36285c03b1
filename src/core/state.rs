use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    http: reqwest::Client,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, redis: RedisHandle) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.team_sync().timeout_seconds))
            .user_agent(concat!("quizdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Failed to build HTTP client; using defaults");
                reqwest::Client::new()
            });

        Self { inner: Arc::new(InnerState { settings, db, redis, http }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
