pub mod applications;
pub mod error;
pub mod features;
pub mod grants;
pub mod http;
pub mod pagination;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConflictReason, Entity, ErrorKind, WorkflowError};
pub use pagination::{ListingConfig, Page};
