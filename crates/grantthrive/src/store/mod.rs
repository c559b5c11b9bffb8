//! Persistence boundary. Every guarded transition runs inside one
//! [`Store::transaction`], so the status check and the status write commit
//! together or not at all.

pub mod memory;

pub use memory::MemoryStore;

use crate::access::{OrganizationId, UserId};
use crate::workflows::applications::{Application, ApplicationFilter, ApplicationId};
use crate::workflows::features::FeatureToggle;
use crate::workflows::grants::{Grant, GrantFilter, GrantId};

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Transaction provider consumed by the workflow services.
pub trait Store: Send + Sync {
    /// Runs `work` as one atomic unit. Writes become visible only when `work`
    /// returns `Ok`; an `Err` discards all of them.
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Row-level operations available inside a transaction.
pub trait StoreTransaction {
    fn grant(&self, id: GrantId) -> Result<Option<Grant>, RepositoryError>;
    fn grant_by_slug(&self, slug: &str) -> Result<Option<Grant>, RepositoryError>;
    /// Matching grants, newest first.
    fn grants(&self, filter: &GrantFilter) -> Result<Vec<Grant>, RepositoryError>;
    fn next_grant_id(&mut self) -> Result<GrantId, RepositoryError>;
    fn insert_grant(&mut self, grant: Grant) -> Result<(), RepositoryError>;
    fn update_grant(&mut self, grant: Grant) -> Result<(), RepositoryError>;

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn application_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Application>, RepositoryError>;
    fn application_for(
        &self,
        grant_id: GrantId,
        applicant_id: UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Matching applications, newest first.
    fn applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn next_application_id(&mut self) -> Result<ApplicationId, RepositoryError>;
    fn insert_application(&mut self, application: Application) -> Result<(), RepositoryError>;
    fn update_application(&mut self, application: Application) -> Result<(), RepositoryError>;

    fn feature_toggles(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<FeatureToggle>, RepositoryError>;
    fn put_feature_toggle(&mut self, toggle: FeatureToggle) -> Result<(), RepositoryError>;
}
