use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::{error::AppResult, utils::jwt::JwtKeys};

pub type UserId = i64;

/// Full account row, including the credential hash. Only the owner ever
/// sees the serialized form.
#[derive(Debug, Default, Serialize, FromRow)]
pub struct UserAuth {
    #[serde(skip)]
    pub id: UserId,
    #[serde(skip)]
    pub hash: String,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub is_active: bool,
    #[serde(skip)]
    pub session_epoch: i64,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserAuth {
    /// Attaches a token bound to the user's current session epoch.
    pub fn with_token(mut self, keys: &JwtKeys) -> AppResult<Self> {
        self.token = Some(keys.generate(self.id, self.session_epoch)?);
        Ok(self)
    }
}
