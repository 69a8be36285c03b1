use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;
use crate::db::types::QuizType;

const ARGON2_MEMORY_KIB: u32 = 19_456;
const ARGON2_TIME: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("password hashing failed")]
    Hashing,
    #[error("password verification failed")]
    Verification,
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Admin,
    Team,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
    pub(crate) kind: TokenKind,
    /// Quiz unlocked by the entry code; only present on team tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) quiz_type: Option<QuizType>,
}

fn argon2() -> Result<Argon2<'static>, SecurityError> {
    let params = argon2::Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME, ARGON2_PARALLELISM, None)
        .map_err(|_| SecurityError::Hashing)?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
}

pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| SecurityError::Hashing)?
        .to_string();

    Ok(hash)
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(hash).map_err(|_| SecurityError::Verification)?;
    let argon2 = argon2().map_err(|_| SecurityError::Verification)?;

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::Verification),
    }
}

/// Team passwords are handed out on paper: the lot name followed by the event suffix.
pub(crate) fn team_password(lotname: &str, suffix: &str) -> String {
    format!("{lotname}{suffix}")
}

/// Slack past the submit deadline so a submit sent at the last second still authenticates.
const SESSION_TOKEN_SLACK: Duration = Duration::minutes(5);

pub(crate) fn create_admin_token(admin_id: i64, settings: &Settings) -> Result<String, SecurityError> {
    let lifetime = Duration::minutes(settings.security().token_ttl_minutes as i64);
    let claims = Claims {
        sub: admin_id.to_string(),
        exp: (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
        kind: TokenKind::Admin,
        quiz_type: None,
    };
    sign(&claims, settings)
}

/// Token handed out by the quiz login. It covers an attempt started soon after logging in;
/// `POST /quiz/start` replaces it with [`create_session_token`].
pub(crate) fn create_team_token(
    team_id: i64,
    quiz_type: QuizType,
    settings: &Settings,
) -> Result<String, SecurityError> {
    let lifetime = settings.quiz().time_limit()
        + settings.quiz().submit_grace()
        + Duration::minutes(30);
    team_token(team_id, quiz_type, OffsetDateTime::now_utc() + lifetime, settings)
}

/// Team token valid until just after `submit_deadline`, however late the attempt started.
pub(crate) fn create_session_token(
    team_id: i64,
    quiz_type: QuizType,
    submit_deadline: OffsetDateTime,
    settings: &Settings,
) -> Result<String, SecurityError> {
    team_token(team_id, quiz_type, submit_deadline + SESSION_TOKEN_SLACK, settings)
}

fn team_token(
    team_id: i64,
    quiz_type: QuizType,
    expires_at: OffsetDateTime,
    settings: &Settings,
) -> Result<String, SecurityError> {
    let claims = Claims {
        sub: team_id.to_string(),
        exp: expires_at.unix_timestamp(),
        kind: TokenKind::Team,
        quiz_type: Some(quiz_type),
    };
    sign(&claims, settings)
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

/// Stable, non-reversible identifier of a token, used as the deny-list key.
pub(crate) fn token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn sign(claims: &Claims, settings: &Settings) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    encode(
        &jsonwebtoken::Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
