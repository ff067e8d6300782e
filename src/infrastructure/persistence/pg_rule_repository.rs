//! PostgreSQL implementation of the domain rule repository.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::{DomainRule, NewDomainRule, SecurityMode};
use crate::domain::repositories::DomainRuleRepository;
use crate::error::AppError;
use crate::infrastructure::db::Db;

/// PostgreSQL repository for domain policy rules.
pub struct PgDomainRuleRepository {
    db: Arc<Db>,
}

impl PgDomainRuleRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DomainRuleRepository for PgDomainRuleRepository {
    async fn create(&self, rule: NewDomainRule) -> Result<DomainRule, AppError> {
        let created = self
            .db
            .with_retry(|| async {
                sqlx::query_as::<_, DomainRule>(
                    r#"
                    INSERT INTO domain_rules (domain, rule_type)
                    VALUES ($1, $2)
                    RETURNING id, domain, rule_type, active, created_at
                    "#,
                )
                .bind(&rule.domain)
                .bind(rule.rule_type.as_str())
                .fetch_one(self.db.pool())
                .await
            })
            .await?;

        Ok(created)
    }

    async fn list_active(&self, mode: SecurityMode) -> Result<Vec<DomainRule>, AppError> {
        let rules = self
            .db
            .with_retry(|| async {
                sqlx::query_as::<_, DomainRule>(
                    r#"
                    SELECT id, domain, rule_type, active, created_at
                    FROM domain_rules
                    WHERE rule_type = $1 AND active = TRUE
                    ORDER BY created_at
                    "#,
                )
                .bind(mode.as_str())
                .fetch_all(self.db.pool())
                .await
            })
            .await?;

        Ok(rules)
    }
}
