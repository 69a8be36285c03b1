use thiserror::Error;

/// Everything the API server and the worker read from the environment.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) server: ServerSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) security: SecuritySettings,
    pub(super) cors_origins: Vec<String>,
    pub(super) database: DatabaseSettings,
    pub(super) redis: RedisSettings,
    pub(super) quiz: QuizSettings,
    pub(super) import: ImportSettings,
    pub(super) team_sync: TeamSyncSettings,
    pub(super) admin: AdminSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) name: String,
    pub(crate) version: String,
    /// Mount point of every versioned route, e.g. `/api/v1`.
    pub(crate) prefix: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SecuritySettings {
    pub(crate) secret_key: String,
    pub(crate) token_ttl_minutes: u64,
    pub(crate) algorithm: String,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    /// Takes precedence over the individual `POSTGRES_*` parts.
    pub(crate) explicit_url: Option<String>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RedisSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) db: u16,
    pub(crate) password: Option<String>,
}

/// Rules of a single quiz attempt.
#[derive(Debug, Clone)]
pub(crate) struct QuizSettings {
    pub(crate) questions_per_attempt: u32,
    pub(crate) time_limit_minutes: u64,
    pub(crate) submit_grace_seconds: u64,
    pub(crate) max_tab_switches: u32,
    pub(crate) team_password_suffix: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ImportSettings {
    pub(crate) max_upload_size_mb: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct TeamSyncSettings {
    pub(crate) url: String,
    pub(crate) timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct AdminSettings {
    pub(crate) first_admin_username: String,
    pub(crate) first_admin_password: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    /// Refuse to start with missing secrets; always on in production.
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid server host: {0:?}")]
    InvalidHost(String),
    #[error("invalid server port: {0}")]
    InvalidPort(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl ServerSettings {
    pub(super) fn parse(host: String, port: String) -> Result<Self, ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(host));
        }
        match port.parse::<u16>() {
            Ok(port) if port > 0 => Ok(Self { host, port }),
            _ => Err(ConfigError::InvalidPort(port)),
        }
    }

    pub(crate) fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseSettings {
    pub(crate) fn url(&self) -> String {
        match &self.explicit_url {
            Some(url) => url.clone(),
            None => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl RedisSettings {
    pub(crate) fn url(&self) -> String {
        let auth = self.password.as_deref().map(|password| format!(":{password}@")).unwrap_or_default();
        format!("redis://{auth}{}:{}/{}", self.host, self.port, self.db)
    }
}

impl QuizSettings {
    pub(crate) fn time_limit(&self) -> time::Duration {
        time::Duration::minutes(self.time_limit_minutes as i64)
    }

    pub(crate) fn submit_grace(&self) -> time::Duration {
        time::Duration::seconds(self.submit_grace_seconds as i64)
    }
}
