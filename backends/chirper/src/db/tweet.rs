use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::{AppError, AppResult, DBError},
    utils::auth::ActorContext,
};

use super::{Page, UserId};

#[derive(Debug, Serialize, FromRow)]
pub struct Tweet {
    pub id: i64,
    #[serde(skip)]
    pub user_id: UserId,
    /// Username of the owner.
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_tweet(
    pool: &SqlitePool,
    actor: &ActorContext,
    content: &str,
) -> AppResult<Tweet> {
    let created_at = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO tweets (user_id, content, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(actor.user_id)
    .bind(content)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    tracing::info!(actor = %actor.username, tweet_id = id, "tweet created");
    Ok(Tweet {
        id,
        user_id: actor.user_id,
        author: actor.username.clone(),
        content: content.to_string(),
        created_at,
    })
}

pub async fn get_tweet(pool: &SqlitePool, tweet_id: i64) -> AppResult<Tweet> {
    let tweet = sqlx::query_as::<_, Tweet>(
        "
        SELECT tweets.id, tweets.user_id, users.username AS author, tweets.content, tweets.created_at
        FROM tweets
        INNER JOIN users ON users.id = tweets.user_id
        WHERE tweets.id = ?
        ",
    )
    .bind(tweet_id)
    .fetch_optional(pool)
    .await?;

    tweet.ok_or(AppError::DBError(DBError::NotFound("Tweet")))
}

/// Deletes a tweet owned by `actor`. Someone else's tweet is `Forbidden`, a
/// missing one `NotFound`; neither touches the store.
pub async fn delete_tweet(pool: &SqlitePool, actor: &ActorContext, tweet_id: i64) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM tweets WHERE id = ? AND user_id = ?")
        .bind(tweet_id)
        .bind(actor.user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        tracing::info!(actor = %actor.username, tweet_id, "tweet deleted");
        return Ok(());
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tweets WHERE id = ?)")
        .bind(tweet_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Err(AppError::Forbidden("You can only delete your own tweets."))
    } else {
        Err(DBError::NotFound("Tweet").into())
    }
}

/// Every tweet, newest first.
pub async fn list_tweets(pool: &SqlitePool, page: &Page) -> AppResult<Vec<Tweet>> {
    let tweets = sqlx::query_as::<_, Tweet>(
        "
        SELECT tweets.id, tweets.user_id, users.username AS author, tweets.content, tweets.created_at
        FROM tweets
        INNER JOIN users ON users.id = tweets.user_id
        ORDER BY tweets.created_at DESC, tweets.id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(tweets)
}

/// Tweets by one user, newest first.
pub async fn list_user_tweets(
    pool: &SqlitePool,
    user_id: UserId,
    page: &Page,
) -> AppResult<Vec<Tweet>> {
    let tweets = sqlx::query_as::<_, Tweet>(
        "
        SELECT tweets.id, tweets.user_id, users.username AS author, tweets.content, tweets.created_at
        FROM tweets
        INNER JOIN users ON users.id = tweets.user_id
        WHERE tweets.user_id = ?
        ORDER BY tweets.created_at DESC, tweets.id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(tweets)
}
