use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::{Validate, ValidationError};

use crate::{
    db::{self, Page},
    error::AppResult,
    utils::{
        auth::ActorContext,
        extract::{Json, Path, Query},
        form,
    },
};

pub const MAX_TWEET_LENGTH: usize = 140;

/// Non-blank and at most [`MAX_TWEET_LENGTH`] characters. The length error
/// names the actual character count.
fn validate_content(content: &str) -> Result<(), ValidationError> {
    form::required(content)?;

    let length = content.chars().count();
    if length > MAX_TWEET_LENGTH {
        let mut error = form::error(
            "max_length",
            format!(
                "Ensure this value has at most {MAX_TWEET_LENGTH} characters (it has {length})."
            ),
        );
        error.add_param("limit_value".into(), &MAX_TWEET_LENGTH);
        error.add_param("show_value".into(), &length);
        return Err(error);
    }

    Ok(())
}

#[derive(Deserialize)]
pub struct CreateTweet {
    tweet: CreateTweetData,
}

#[derive(Debug, Deserialize, Validate)]
struct CreateTweetData {
    #[serde(default, deserialize_with = "form::trimmed")]
    #[validate(custom = "validate_content")]
    content: String,
}

// GET /tweets/home/
pub async fn home(
    State(pool): State<SqlitePool>,
    _: ActorContext,
    Query(page): Query<Page>,
) -> AppResult<impl IntoResponse> {
    let tweets = db::list_tweets(&pool, &page).await?;
    Ok(Json(json!({ "tweet_list": tweets })))
}

// POST /tweets/create/
pub async fn create_tweet(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
    Json(CreateTweet { tweet }): Json<CreateTweet>,
) -> AppResult<impl IntoResponse> {
    tweet.validate()?;

    let tweet = db::create_tweet(&pool, &actor, &tweet.content).await?;
    Ok((StatusCode::CREATED, Json(json!({ "tweet": tweet }))))
}

// GET /tweets/:id/
pub async fn get_tweet(
    State(pool): State<SqlitePool>,
    _: ActorContext,
    Path(tweet_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let tweet = db::get_tweet(&pool, tweet_id).await?;
    Ok(Json(json!({ "tweet": tweet })))
}

// POST /tweets/:id/delete/
pub async fn delete_tweet(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
    Path(tweet_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    db::delete_tweet(&pool, &actor, tweet_id).await?;
    Ok(Json(json!({ "message": "OK" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_the_limit_is_accepted() {
        assert!(validate_content(&"a".repeat(MAX_TWEET_LENGTH)).is_ok());
        assert!(validate_content("hello").is_ok());
    }

    #[test]
    fn overlong_content_names_its_length() {
        let error = validate_content(&"a".repeat(300)).unwrap_err();
        assert_eq!(
            error.message.as_deref(),
            Some("Ensure this value has at most 140 characters (it has 300).")
        );

        let error = validate_content(&"a".repeat(141)).unwrap_err();
        assert!(error.message.unwrap().contains("(it has 141)"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_TWEET_LENGTH);
        assert!(content.len() > MAX_TWEET_LENGTH);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn blank_content_is_required() {
        let error = validate_content("").unwrap_err();
        assert_eq!(error.message.as_deref(), Some(form::REQUIRED));
    }

    #[test]
    fn surrounding_whitespace_is_not_content() {
        let data: CreateTweetData = serde_json::from_str(r#"{ "content": "   " }"#).unwrap();
        assert!(data.validate().is_err());

        let data: CreateTweetData = serde_json::from_str(r#"{ "content": " hello " }"#).unwrap();
        assert_eq!(data.content, "hello");
        assert!(data.validate().is_ok());
    }
}
