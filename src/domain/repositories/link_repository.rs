//! Repository trait for short link data access.

use crate::domain::entities::{NewLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for stored short links.
///
/// Link CRUD beyond creation lives in the external admin surface; this crate
/// only needs lookup by path plus creation for seeding and tests.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - in-memory, for tests and local runs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the path already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its path slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_path(&self, path: &str) -> Result<Option<ShortLink>, AppError>;
}
