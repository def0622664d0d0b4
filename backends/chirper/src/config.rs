use std::{env, fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};

const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub token_ttl_days: i64,
    pub rate_limit_per_sec: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config = Self {
            port: try_load("CHIRPER_PORT", "8000")?,
            database_url: try_load("DATABASE_URL", "sqlite://chirper.db")?,
            secret_key: secret_key(),
            token_ttl_days: try_load("TOKEN_TTL_DAYS", "30")?,
            rate_limit_per_sec: try_load("RATE_LIMIT_PER_SEC", "50")?,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            bail!("TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS}");
        }
        if self.rate_limit_per_sec == 0 {
            bail!("RATE_LIMIT_PER_SEC must be positive");
        }
        Ok(())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn secret_key() -> String {
    var("SECRET_KEY").unwrap_or_else(|| {
        warn!("SECRET_KEY not set, tokens will not survive a restart");
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect()
    })
}
