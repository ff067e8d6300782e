//! Database handle: managed connection pool, retry policy, health check.
//!
//! The pool connects lazily on first use and is closed explicitly from the
//! shutdown path. All persistence calls go through [`Db::with_retry`] so the
//! backoff behavior lives in one place instead of per call site.

use anyhow::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;
use tracing::warn;

/// Reusable retry policy: delays grow linearly, `base_delay * attempt`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay sequence between attempts; `max_attempts - 1` entries.
    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.base_delay;
        (1u32..)
            .map(move |attempt| base * attempt)
            .take(self.max_attempts.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Runs `op` under the policy, retrying failed attempts with linear backoff.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    Retry::spawn(policy.delays(), op).await
}

/// Pool tuning knobs, loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Owned database handle.
pub struct Db {
    pool: PgPool,
    retry: RetryPolicy,
}

impl Db {
    /// Builds the pool without opening a connection; the first query
    /// connects.
    pub fn connect_lazy(
        database_url: &str,
        settings: PoolSettings,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .idle_timeout(settings.idle_timeout)
            .max_lifetime(settings.max_lifetime)
            .connect_lazy(database_url)?;

        Ok(Self { pool, retry })
    }

    /// Wraps an existing pool; used by tests.
    pub fn from_pool(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Runs `op` under this handle's retry policy.
    pub async fn with_retry<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        with_retry(&self.retry, op).await
    }

    /// Trivial round-trip query, retried under the policy.
    pub async fn health_check(&self) -> bool {
        let result = self
            .with_retry(|| async { sqlx::query("SELECT 1").execute(&self.pool).await })
            .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("database health check failed: {e}");
                false
            }
        }
    }

    /// Closes the pool. Hooked to the shutdown signal path.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
