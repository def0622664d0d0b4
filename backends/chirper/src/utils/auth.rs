use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    headers::Authorization,
    http::request::Parts,
    TypedHeader,
};
use sqlx::SqlitePool;

use crate::{
    db::{self, UserId},
    error::AppError,
};

use super::jwt::{JWTToken, JwtKeys};

/// The authenticated user a request acts on behalf of. Every operation that
/// depends on "who is asking" takes one of these explicitly.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: UserId,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(token)) =
            TypedHeader::<Authorization<JWTToken>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let claims = JwtKeys::from_ref(state).verify(&token.0)?;
        let pool = SqlitePool::from_ref(state);

        let Some(user) = db::find_user(&pool, claims.user_id).await? else {
            return Err(AppError::Unauthorized);
        };

        // Tokens minted before a logout or password change carry a stale epoch.
        if !user.is_active || user.session_epoch != claims.epoch {
            return Err(AppError::Unauthorized);
        }

        Ok(Self {
            user_id: user.id,
            username: user.username,
        })
    }
}
