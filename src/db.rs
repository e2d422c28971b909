use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;

use crate::{config::AppConfig, error::StoreError};

/// Pooled connection handle plus the per-call deadline every query runs under.
#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
    pub timeout: Duration,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self {
            pool,
            timeout: Duration::from_secs(config.db_timeout_secs),
        })
    }

    /// Run a query future, cancelling it once the deadline passes.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        bounded(self.timeout, op, fut)
            .await?
            .map_err(StoreError::from_sqlx)
    }
}

/// Await `fut` for at most `limit`; the future is dropped on expiry.
pub async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        warn!(op, timeout_ms = limit.as_millis() as u64, "store operation timed out");
        StoreError::Timeout(limit)
    })
}
