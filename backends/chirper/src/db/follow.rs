use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::{AppError, AppResult},
    utils::auth::ActorContext,
};

use super::{get_user_profile, Page, UserId, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    /// The edge already existed; nothing was written.
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// The viewer follows the subject.
    pub following: bool,
    /// The subject follows the viewer.
    pub followed_by: bool,
    pub mutual: bool,
}

/// One row of a following/follower listing: the edge and the user on the
/// other end of it.
#[derive(Debug, Serialize, FromRow)]
pub struct FollowEntry {
    #[serde(skip)]
    pub edge_id: i64,
    pub followed_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub user: UserProfile,
}

pub async fn follow(
    pool: &SqlitePool,
    actor: &ActorContext,
    username: &str,
) -> AppResult<(UserProfile, FollowOutcome)> {
    let target = get_user_profile(pool, username).await?;

    if target.id == actor.user_id {
        return Err(AppError::InvalidRequest(
            "You cannot follow yourself.".to_string(),
        ));
    }

    // The unique (follower_id, following_id) constraint arbitrates concurrent
    // identical requests; whoever loses sees zero affected rows.
    let inserted = sqlx::query(
        "
        INSERT INTO follows (follower_id, following_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (follower_id, following_id) DO NOTHING
        ",
    )
    .bind(actor.user_id)
    .bind(target.id)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .rows_affected();

    let outcome = match inserted {
        0 => FollowOutcome::AlreadyFollowing,
        _ => FollowOutcome::Followed,
    };

    tracing::info!(actor = %actor.username, target = %target.username, ?outcome, "follow");
    Ok((target, outcome))
}

pub async fn unfollow(
    pool: &SqlitePool,
    actor: &ActorContext,
    username: &str,
) -> AppResult<UserProfile> {
    let target = get_user_profile(pool, username).await?;

    let deleted = if target.id == actor.user_id {
        0
    } else {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(actor.user_id)
            .bind(target.id)
            .execute(pool)
            .await?
            .rows_affected()
    };

    if deleted == 0 {
        return Err(AppError::InvalidRequest(
            "You cannot unfollow someone you do not follow, or yourself.".to_string(),
        ));
    }

    tracing::info!(actor = %actor.username, target = %target.username, "unfollow");
    Ok(target)
}

/// Number of users `user_id` follows.
pub async fn following_count(pool: &SqlitePool, user_id: UserId) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of users following `user_id`.
pub async fn follower_count(pool: &SqlitePool, user_id: UserId) -> AppResult<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Users followed by `username`, most recently followed first. An unknown
/// username simply has nobody in the list.
pub async fn following_list(
    pool: &SqlitePool,
    username: &str,
    page: &Page,
) -> AppResult<Vec<FollowEntry>> {
    let entries = sqlx::query_as::<_, FollowEntry>(
        "
        SELECT
            follows.id AS edge_id,
            follows.created_at AS followed_at,
            users.id,
            users.username,
            users.date_joined
        FROM follows
        INNER JOIN users ON users.id = follows.following_id
        WHERE follows.follower_id = (SELECT id FROM users WHERE username = ?)
        ORDER BY follows.created_at DESC, follows.id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(username)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Users following `username`, most recent first.
pub async fn follower_list(
    pool: &SqlitePool,
    username: &str,
    page: &Page,
) -> AppResult<Vec<FollowEntry>> {
    let entries = sqlx::query_as::<_, FollowEntry>(
        "
        SELECT
            follows.id AS edge_id,
            follows.created_at AS followed_at,
            users.id,
            users.username,
            users.date_joined
        FROM follows
        INNER JOIN users ON users.id = follows.follower_id
        WHERE follows.following_id = (SELECT id FROM users WHERE username = ?)
        ORDER BY follows.created_at DESC, follows.id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(username)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

pub async fn relationship(
    pool: &SqlitePool,
    viewer: &ActorContext,
    subject: UserId,
) -> AppResult<Relationship> {
    let (following, followed_by) = sqlx::query_as::<_, (bool, bool)>(
        "
        SELECT
            EXISTS (SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2),
            EXISTS (SELECT 1 FROM follows WHERE follower_id = ?2 AND following_id = ?1)
        ",
    )
    .bind(viewer.user_id)
    .bind(subject)
    .fetch_one(pool)
    .await?;

    Ok(Relationship {
        following,
        followed_by,
        mutual: following && followed_by,
    })
}
