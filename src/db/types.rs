use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "quiztype")]
pub(crate) enum QuizType {
    Tech,
    Software,
}

impl QuizType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Tech => "Tech",
            Self::Software => "Software",
        }
    }

    /// Lowercase form used in export file names.
    pub(crate) fn slug(self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Software => "software",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Tech" => Ok(Self::Tech),
            "Software" => Ok(Self::Software),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptstatus", rename_all = "snake_case")]
pub(crate) enum AttemptStatus {
    NotAttempted,
    Attempted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "quizsessionstatus", rename_all = "lowercase")]
pub(crate) enum QuizSessionStatus {
    Active,
    Submitted,
    Expired,
}
