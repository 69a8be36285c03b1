use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Admin;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminLogin {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub(crate) username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminResponse {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) created_at: String,
}

impl AdminResponse {
    pub(crate) fn from_db(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            created_at: format_primitive(admin.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) admin: AdminResponse,
}
