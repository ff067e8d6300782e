//! Core business entities.

mod domain_rule;
mod link;
mod visit;

pub use domain_rule::{DomainRule, NewDomainRule, SecurityMode};
pub use link::{NewLink, ShortLink};
pub use visit::{VisitMeta, VisitRecord};
