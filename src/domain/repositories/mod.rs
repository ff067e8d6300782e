//! Repository traits decoupling domain logic from storage.

mod link_repository;
mod rule_repository;
mod visit_repository;

pub use link_repository::LinkRepository;
pub use rule_repository::DomainRuleRepository;
pub use visit_repository::VisitRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use rule_repository::MockDomainRuleRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
