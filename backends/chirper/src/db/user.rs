use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{AppError, AppResult, DBError};

use super::{UserAuth, UserId};

const USER_COLUMNS: &str =
    "id, username, email, hash, is_active, session_epoch, date_joined, last_login";

/// Public view of an account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    #[serde(skip)]
    pub id: UserId,
    pub username: String,
    pub date_joined: DateTime<Utc>,
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    hash: &str,
) -> AppResult<UserAuth> {
    let user = sqlx::query_as::<_, UserAuth>(&format!(
        "INSERT INTO users (username, email, hash, date_joined)
        VALUES (?, ?, ?, ?)
        RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match user {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(DBError::UsernameTaken.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn find_user(pool: &SqlitePool, user_id: UserId) -> AppResult<Option<UserAuth>> {
    let user =
        sqlx::query_as::<_, UserAuth>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, user_id: UserId) -> AppResult<UserAuth> {
    find_user(pool, user_id)
        .await?
        .ok_or(AppError::DBError(DBError::NotFound("User")))
}

pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<UserAuth>> {
    let user = sqlx::query_as::<_, UserAuth>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_profile(pool: &SqlitePool, username: &str) -> AppResult<UserProfile> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, username, date_joined FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    profile.ok_or(AppError::DBError(DBError::NotFound("User")))
}

pub async fn record_login(pool: &SqlitePool, user_id: UserId) -> AppResult<UserAuth> {
    let user = sqlx::query_as::<_, UserAuth>(&format!(
        "UPDATE users SET last_login = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or(AppError::DBError(DBError::NotFound("User")))
}

/// Invalidates every token issued to the user so far.
pub async fn bump_session_epoch(pool: &SqlitePool, user_id: UserId) -> AppResult<i64> {
    let epoch = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET session_epoch = session_epoch + 1 WHERE id = ? RETURNING session_epoch",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    epoch.ok_or(AppError::DBError(DBError::NotFound("User")))
}

/// Stores a new credential hash and revokes outstanding tokens.
pub async fn set_password(pool: &SqlitePool, user_id: UserId, hash: &str) -> AppResult<UserAuth> {
    let user = sqlx::query_as::<_, UserAuth>(&format!(
        "UPDATE users
            SET hash = ?, session_epoch = session_epoch + 1
            WHERE id = ?
        RETURNING {USER_COLUMNS}"
    ))
    .bind(hash)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or(AppError::DBError(DBError::NotFound("User")))
}

/// Removes a user together with every follow edge and tweet that references it.
pub async fn delete_user(pool: &SqlitePool, user_id: UserId) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM follows WHERE follower_id = ?1 OR following_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tweets WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Err(DBError::NotFound("User").into());
    }

    tx.commit().await?;
    tracing::info!(user_id, "deleted user");
    Ok(())
}
