//! A small social network backend: accounts, short posts ("tweets") and a
//! directed follow graph between users, served as JSON over HTTP.
//!
//! Every route except signup and login expects `Authorization: Token <jwt>`.
//! Tokens carry the user's session epoch, so logging out or changing the
//! password revokes everything issued before.

use std::net::SocketAddr;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio::signal::{self, ctrl_c};
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod utils;

use config::Config;
use utils::jwt::JwtKeys;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub keys: JwtKeys,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            keys: JwtKeys::from_secret(config.secret_key.as_bytes(), config.token_ttl_days),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> SqlitePool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(app_state: &AppState) -> JwtKeys {
        app_state.keys.clone()
    }
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Connecting to {}", config.database_url);
    let pool = db::connect(&config.database_url).await?;
    db::prepare_db(&pool).await?;

    let app = routes::generate_routes(AppState::new(pool, &config), &config);

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server running on {address}");

    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
