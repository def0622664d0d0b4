mod auth;
pub use auth::*;
mod follow;
pub use follow::*;
mod tweet;
pub use tweet::*;
mod user;
pub use user::*;

use std::str::FromStr;

use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Executor, SqlitePool,
};

const MAX_POOL_SIZE: u32 = 5;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Opens a pool for `database_url`. In-memory databases are pinned to a single
/// connection that is never recycled, since the data dies with it.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if database_url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(MAX_POOL_SIZE)
        .connect_with(options.journal_mode(SqliteJournalMode::Wal))
        .await
}

pub async fn prepare_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("sql/schema.sql")).await?;
    Ok(())
}

/// `limit`/`offset` window shared by every list query.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        let page = Page::default();
        assert_eq!((page.limit(), page.offset()), (20, 0));

        let page = Page {
            limit: Some(1_000),
            offset: Some(-5),
        };
        assert_eq!((page.limit(), page.offset()), (100, 0));

        let page = Page {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!((page.limit(), page.offset()), (1, 40));
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let pool = test_support::pool().await;
        prepare_db(&pool).await.unwrap();
    }
}
