//! Grant entity, its Draft → Published → Closed/Archived status machine, and
//! the service and router that expose it.

pub mod domain;
pub mod lifecycle;
pub mod query;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    slugify, Grant, GrantCategory, GrantId, GrantStatus, GrantUpdate, NewGrant,
};
pub use lifecycle::GrantAction;
pub use query::{GrantFilter, GrantQuery};
pub use router::grant_router;
pub use service::GrantService;
