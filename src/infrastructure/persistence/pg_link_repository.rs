//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::db::Db;

/// PostgreSQL repository for short links.
///
/// Queries are bound at runtime and executed under the shared retry policy.
pub struct PgLinkRepository {
    db: Arc<Db>,
}

impl PgLinkRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, AppError> {
        let link = self
            .db
            .with_retry(|| async {
                sqlx::query_as::<_, ShortLink>(
                    r#"
                    INSERT INTO links
                        (path, original_url, title, password_digest,
                         require_confirm, enable_intermediate, expires_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id, path, original_url, title, password_digest,
                              require_confirm, enable_intermediate, expires_at,
                              views, created_at
                    "#,
                )
                .bind(&new_link.path)
                .bind(&new_link.original_url)
                .bind(&new_link.title)
                .bind(&new_link.password_digest)
                .bind(new_link.require_confirm)
                .bind(new_link.enable_intermediate)
                .bind(new_link.expires_at)
                .fetch_one(self.db.pool())
                .await
            })
            .await?;

        Ok(link)
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<ShortLink>, AppError> {
        let link = self
            .db
            .with_retry(|| async {
                sqlx::query_as::<_, ShortLink>(
                    r#"
                    SELECT id, path, original_url, title, password_digest,
                           require_confirm, enable_intermediate, expires_at,
                           views, created_at
                    FROM links
                    WHERE path = $1
                    "#,
                )
                .bind(path)
                .fetch_optional(self.db.pool())
                .await
            })
            .await?;

        Ok(link)
    }
}
