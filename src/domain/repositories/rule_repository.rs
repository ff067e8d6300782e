//! Repository trait for domain policy rules.

use crate::domain::entities::{DomainRule, NewDomainRule, SecurityMode};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for domain allow/deny rules.
///
/// Rule CRUD forms are an external collaborator; the redirect path only ever
/// reads the active rules for the current security mode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRuleRepository: Send + Sync {
    /// Creates a rule. The domain arrives normalized (lowercase).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if an identical rule exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, rule: NewDomainRule) -> Result<DomainRule, AppError>;

    /// Lists active rules whose type matches `mode`.
    ///
    /// Rules of the inactive mode are inert, not deleted: they are simply
    /// never returned here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_active(&self, mode: SecurityMode) -> Result<Vec<DomainRule>, AppError>;
}
