use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    BoxError, Json, Router,
};
use serde_json::json;
use std::time::Duration;
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{api, config::Config, AppState};

pub fn generate_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        // ==== ACCOUNTS ==== //
        .route("/accounts/signup/", post(api::auth::signup))
        .route("/accounts/login/", post(api::auth::login))
        .route("/accounts/logout/", post(api::auth::logout))
        .route("/accounts/password/", post(api::auth::change_password))
        .route("/accounts/me/", get(api::auth::current_user))
        // ==== PROFILES ==== //
        .route("/accounts/:username/", get(api::profile::get_profile))
        .route(
            "/accounts/:username/follow/",
            post(api::profile::follow_profile),
        )
        .route(
            "/accounts/:username/unfollow/",
            post(api::profile::unfollow_profile),
        )
        .route(
            "/accounts/:username/following_list/",
            get(api::profile::following_list),
        )
        .route(
            "/accounts/:username/follower_list/",
            get(api::profile::follower_list),
        )
        // ==== TWEETS ==== //
        .route("/tweets/home/", get(api::tweets::home))
        .route("/tweets/create/", post(api::tweets::create_tweet))
        .route("/tweets/:id/", get(api::tweets::get_tweet))
        .route("/tweets/:id/delete/", post(api::tweets::delete_tweet))
        .fallback(handler_404)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: BoxError| async move {
                    tracing::error!(error = %err, "middleware failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Internal Server Error" })),
                    )
                }))
                .layer(BufferLayer::new(1024))
                .layer(RateLimitLayer::new(
                    config.rate_limit_per_sec,
                    Duration::from_secs(1),
                )),
        )
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "nothing to see here" })),
    )
}
