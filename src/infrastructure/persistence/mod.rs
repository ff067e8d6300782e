//! Repository implementations.
//!
//! PostgreSQL repositories for production, DashMap-backed in-memory
//! repositories for tests and database-free runs.

mod memory;
mod pg_link_repository;
mod pg_rule_repository;
mod pg_visit_repository;

pub use memory::{InMemoryDomainRuleRepository, InMemoryLinkRepository, InMemoryVisitRepository};
pub use pg_link_repository::PgLinkRepository;
pub use pg_rule_repository::PgDomainRuleRepository;
pub use pg_visit_repository::PgVisitRepository;
