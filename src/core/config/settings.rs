use super::parsing::{
    env_flag, env_number, env_optional, env_or_default, parse_cors_origins, parse_environment,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, DatabaseSettings, Environment, ImportSettings,
    QuizSettings, RedisSettings, RuntimeSettings, SecuritySettings, ServerSettings, Settings,
    TeamSyncSettings, TelemetrySettings,
};

const DEFAULT_TEAM_SYNC_URL: &str = "https://anjacstrata.in/mob/get_isused_lots.php";

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("QUIZDESK_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let runtime = RuntimeSettings {
            environment,
            strict_config: env_flag("QUIZDESK_STRICT_CONFIG")
                || environment == Environment::Production,
        };

        let server = ServerSettings::parse(
            env_or_default("QUIZDESK_HOST", "0.0.0.0"),
            env_or_default("QUIZDESK_PORT", "8000"),
        )?;

        let api = ApiSettings {
            name: env_or_default("PROJECT_NAME", "Quizdesk API"),
            version: env_or_default("VERSION", env!("CARGO_PKG_VERSION")),
            prefix: env_or_default("API_V1_STR", "/api/v1"),
        };

        let security = SecuritySettings {
            secret_key: env_optional("SECRET_KEY").unwrap_or_else(|| {
                load_or_create_secret_key(env_optional("QUIZDESK_SECRET_FILE"))
            }),
            token_ttl_minutes: env_number("ACCESS_TOKEN_EXPIRE_MINUTES", 720)?,
            algorithm: env_or_default("ALGORITHM", "HS256"),
        };

        let database = DatabaseSettings {
            explicit_url: env_optional("DATABASE_URL"),
            host: env_or_default("POSTGRES_SERVER", "localhost"),
            port: env_number("POSTGRES_PORT", 5432)?,
            user: env_or_default("POSTGRES_USER", "quizdesk"),
            password: env_or_default("POSTGRES_PASSWORD", ""),
            name: env_or_default("POSTGRES_DB", "quizdesk"),
        };

        let redis = RedisSettings {
            host: env_or_default("REDIS_HOST", "localhost"),
            port: env_number("REDIS_PORT", 6379)?,
            db: env_number("REDIS_DB", 0)?,
            password: env_optional("REDIS_PASSWORD"),
        };

        let quiz = QuizSettings {
            questions_per_attempt: env_number("QUIZ_QUESTIONS_PER_ATTEMPT", 10)?,
            time_limit_minutes: env_number("QUIZ_TIME_LIMIT_MINUTES", 30)?,
            submit_grace_seconds: env_number("QUIZ_SUBMIT_GRACE_SECONDS", 30)?,
            max_tab_switches: env_number("QUIZ_MAX_TAB_SWITCHES", 1)?,
            team_password_suffix: env_or_default("TEAM_PASSWORD_SUFFIX", "@2k25"),
        };

        let settings = Self {
            server,
            runtime,
            api,
            security,
            cors_origins: parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?,
            database,
            redis,
            quiz,
            import: ImportSettings { max_upload_size_mb: env_number("MAX_UPLOAD_SIZE_MB", 10)? },
            team_sync: TeamSyncSettings {
                url: env_or_default("TEAM_SYNC_URL", DEFAULT_TEAM_SYNC_URL),
                timeout_seconds: env_number("TEAM_SYNC_TIMEOUT_SECONDS", 20)?,
            },
            admin: AdminSettings {
                first_admin_username: env_or_default("FIRST_ADMIN_USERNAME", "admin"),
                first_admin_password: env_or_default("FIRST_ADMIN_PASSWORD", ""),
            },
            telemetry: TelemetrySettings {
                log_level: env_or_default("QUIZDESK_LOG_LEVEL", "info"),
                json: env_flag("QUIZDESK_LOG_JSON"),
                prometheus_enabled: env_flag("PROMETHEUS_ENABLED"),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }

    pub(crate) fn import(&self) -> &ImportSettings {
        &self.import
    }

    pub(crate) fn team_sync(&self) -> &TeamSyncSettings {
        &self.team_sync
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, u64); 4] = [
            ("QUIZ_QUESTIONS_PER_ATTEMPT", u64::from(self.quiz.questions_per_attempt)),
            ("QUIZ_TIME_LIMIT_MINUTES", self.quiz.time_limit_minutes),
            ("QUIZ_MAX_TAB_SWITCHES", u64::from(self.quiz.max_tab_switches)),
            ("MAX_UPLOAD_SIZE_MB", self.import.max_upload_size_mb),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidValue { field: *field, value: "0".to_string() });
        }
        if self.quiz.team_password_suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "TEAM_PASSWORD_SUFFIX",
                value: "<empty>".to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }
        if self.database.explicit_url.is_none() && self.database.password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_admin_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }
        Ok(())
    }
}
