use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    db::{self, FollowOutcome, Page},
    error::AppResult,
    utils::{
        auth::ActorContext,
        extract::{Json, Path, Query},
    },
};

use super::Notice;

// GET /accounts/:username/
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
    Path(username): Path<String>,
    Query(page): Query<Page>,
) -> AppResult<impl IntoResponse> {
    let profile = db::get_user_profile(&pool, &username).await?;

    let following_count = db::following_count(&pool, profile.id).await?;
    let follower_count = db::follower_count(&pool, profile.id).await?;
    let relationship = db::relationship(&pool, &actor, profile.id).await?;
    let tweets = db::list_user_tweets(&pool, profile.id, &page).await?;

    Ok(Json(json!({
        "profile": profile,
        "following_count": following_count,
        "follower_count": follower_count,
        "relationship": relationship,
        "tweet_list": tweets,
    })))
}

// POST /accounts/:username/follow/
pub async fn follow_profile(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (followee, outcome) = db::follow(&pool, &actor, &username).await?;

    let notice = match outcome {
        FollowOutcome::Followed => {
            Notice::success(format!("You are now following {}.", followee.username))
        }
        FollowOutcome::AlreadyFollowing => {
            Notice::warning(format!("You are already following {}.", followee.username))
        }
    };

    Ok(Json(json!({ "profile": followee, "notice": notice })))
}

// POST /accounts/:username/unfollow/
pub async fn unfollow_profile(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let followee = db::unfollow(&pool, &actor, &username).await?;
    let notice = Notice::success(format!("You unfollowed {}.", followee.username));

    Ok(Json(json!({ "profile": followee, "notice": notice })))
}

// GET /accounts/:username/following_list/
pub async fn following_list(
    State(pool): State<SqlitePool>,
    _: ActorContext,
    Path(username): Path<String>,
    Query(page): Query<Page>,
) -> AppResult<impl IntoResponse> {
    let entries = db::following_list(&pool, &username, &page).await?;
    Ok(Json(json!({ "username": username, "following_list": entries })))
}

// GET /accounts/:username/follower_list/
pub async fn follower_list(
    State(pool): State<SqlitePool>,
    _: ActorContext,
    Path(username): Path<String>,
    Query(page): Query<Page>,
) -> AppResult<impl IntoResponse> {
    let entries = db::follower_list(&pool, &username, &page).await?;
    Ok(Json(json!({ "username": username, "follower_list": entries })))
}
