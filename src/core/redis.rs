use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, AsyncCommands, Client, RedisError, Script};
use tokio::sync::RwLock;

const REVOKED_TOKEN_PREFIX: &str = "revoked:";

// INCR then arm the expiry on the first hit of a window.
const FIXED_WINDOW: &str = r#"
local hits = redis.call("INCR", KEYS[1])
if hits == 1 then
    redis.call("EXPIRE", KEYS[1], ARGV[1])
end
return hits
"#;

/// Lazily connected Redis client shared by login throttling and logout.
///
/// While disconnected, requests are never throttled and no token counts as revoked.
#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    connection: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, connection: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let manager = ConnectionManager::new(Client::open(self.url.as_str())?).await?;
        self.connection.write().await.replace(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        self.connection.write().await.take();
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.connection.read().await.clone()
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        match self.connection().await {
            None => RedisHealth::Disconnected,
            Some(mut conn) => match cmd("PING").query_async::<_, String>(&mut conn).await {
                Ok(_) => RedisHealth::Healthy,
                Err(err) => RedisHealth::Unhealthy(err.to_string()),
            },
        }
    }

    /// Counts a hit on `key` and reports whether it is still within `limit` for the window.
    pub(crate) async fn rate_limit(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let Some(mut conn) = self.connection().await else {
            return Ok(true);
        };

        let hits: u64 =
            Script::new(FIXED_WINDOW).key(key).arg(window_seconds).invoke_async(&mut conn).await?;
        Ok(hits <= limit)
    }

    /// Returns `false` when there was no connection to record the revocation on.
    pub(crate) async fn revoke_token(
        &self,
        fingerprint: &str,
        ttl_seconds: u64,
    ) -> Result<bool, RedisError> {
        let Some(mut conn) = self.connection().await else {
            return Ok(false);
        };

        conn.set_ex::<_, _, ()>(revoked_key(fingerprint), 1, ttl_seconds.max(1)).await?;
        Ok(true)
    }

    pub(crate) async fn is_token_revoked(&self, fingerprint: &str) -> Result<bool, RedisError> {
        match self.connection().await {
            Some(mut conn) => conn.exists(revoked_key(fingerprint)).await,
            None => Ok(false),
        }
    }
}

fn revoked_key(fingerprint: &str) -> String {
    format!("{REVOKED_TOKEN_PREFIX}{fingerprint}")
}
