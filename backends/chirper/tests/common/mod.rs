#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chirper::{config::Config, db, routes, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const PASSWORD: &str = "s3cret-passw0rd";

pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            secret_key: "test-secret".to_string(),
            token_ttl_days: 1,
            rate_limit_per_sec: 10_000,
        };

        let pool = db::connect(&config.database_url).await.unwrap();
        db::prepare_db(&pool).await.unwrap();
        let router = routes::generate_routes(AppState::new(pool.clone(), &config), &config);

        Self { router, pool }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), body).await
    }

    pub async fn try_signup(
        &self,
        username: &str,
        email: &str,
        password1: &str,
        password2: &str,
    ) -> (StatusCode, Value) {
        let body = json!({
            "user": {
                "username": username,
                "email": email,
                "password1": password1,
                "password2": password2,
            }
        });
        self.request(Method::POST, "/accounts/signup/", None, Some(body))
            .await
    }

    /// Signs up `username` with [`PASSWORD`] and returns its token.
    pub async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .try_signup(
                username,
                &format!("{username}@example.com"),
                PASSWORD,
                PASSWORD,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        token_of(&body)
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "user": { "username": username, "password": password } });
        self.request(Method::POST, "/accounts/login/", None, Some(body))
            .await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub fn token_of(body: &Value) -> String {
    body["user"]["token"]
        .as_str()
        .expect("response carries a token")
        .to_string()
}

/// Messages reported for `field` in a 422 body.
pub fn field_errors(body: &Value, field: &str) -> Vec<String> {
    body["errors"][field]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
