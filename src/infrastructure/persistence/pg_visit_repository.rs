//! PostgreSQL implementation of the visit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::entities::VisitMeta;
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;
use crate::infrastructure::db::Db;

/// PostgreSQL repository for the visit log and view counters.
pub struct PgVisitRepository {
    db: Arc<Db>,
}

impl PgVisitRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record_link_visit(
        &self,
        link_id: i64,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError> {
        // Log row and counter move together or not at all. A failed attempt
        // rolls back, so retrying cannot double-count.
        self.db
            .with_retry(|| async {
                let mut tx = self.db.pool().begin().await?;

                sqlx::query(
                    r#"
                    INSERT INTO link_visits (link_id, visited_at, referer, user_agent, ip)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(link_id)
                .bind(visited_at)
                .bind(&meta.referer)
                .bind(&meta.user_agent)
                .bind(&meta.ip)
                .execute(&mut *tx)
                .await?;

                sqlx::query("UPDATE links SET views = views + 1 WHERE id = $1")
                    .bind(link_id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await
            })
            .await?;

        Ok(())
    }

    async fn record_ad_hoc_visit(
        &self,
        target_url: &str,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError> {
        self.db
            .with_retry(|| async {
                sqlx::query(
                    r#"
                    INSERT INTO link_visits (target_url, visited_at, referer, user_agent, ip)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(target_url)
                .bind(visited_at)
                .bind(&meta.referer)
                .bind(&meta.user_agent)
                .bind(&meta.ip)
                .execute(self.db.pool())
                .await
            })
            .await?;

        Ok(())
    }

    async fn count_visits(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = self
            .db
            .with_retry(|| async {
                sqlx::query_scalar("SELECT COUNT(*) FROM link_visits WHERE link_id = $1")
                    .bind(link_id)
                    .fetch_one(self.db.pool())
                    .await
            })
            .await?;

        Ok(count)
    }
}
