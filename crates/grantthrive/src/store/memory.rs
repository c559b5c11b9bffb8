use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{RepositoryError, Store, StoreTransaction};
use crate::access::{OrganizationId, UserId};
use crate::workflows::applications::{Application, ApplicationFilter, ApplicationId};
use crate::workflows::features::{FeatureKey, FeatureToggle};
use crate::workflows::grants::{Grant, GrantFilter, GrantId};

#[derive(Debug, Default, Clone)]
struct Tables {
    grants: BTreeMap<GrantId, Grant>,
    applications: BTreeMap<ApplicationId, Application>,
    feature_toggles: BTreeMap<(OrganizationId, FeatureKey), FeatureToggle>,
    grant_sequence: u64,
    application_sequence: u64,
}

/// Process-local store with serializable transactions.
///
/// The table mutex is held for the whole unit of work and the work operates on
/// a copy of the tables, which replaces the committed state only on success.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut committed = self
            .tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))?;

        let mut transaction = MemoryTransaction {
            tables: committed.clone(),
        };
        let outcome = work(&mut transaction)?;
        *committed = transaction.tables;
        Ok(outcome)
    }
}

struct MemoryTransaction {
    tables: Tables,
}

impl StoreTransaction for MemoryTransaction {
    fn grant(&self, id: GrantId) -> Result<Option<Grant>, RepositoryError> {
        Ok(self.tables.grants.get(&id).cloned())
    }

    fn grant_by_slug(&self, slug: &str) -> Result<Option<Grant>, RepositoryError> {
        Ok(self
            .tables
            .grants
            .values()
            .find(|grant| grant.slug == slug)
            .cloned())
    }

    fn grants(&self, filter: &GrantFilter) -> Result<Vec<Grant>, RepositoryError> {
        Ok(self
            .tables
            .grants
            .values()
            .rev()
            .filter(|grant| filter.matches(grant))
            .cloned()
            .collect())
    }

    fn next_grant_id(&mut self) -> Result<GrantId, RepositoryError> {
        self.tables.grant_sequence += 1;
        Ok(GrantId(self.tables.grant_sequence))
    }

    fn insert_grant(&mut self, grant: Grant) -> Result<(), RepositoryError> {
        let slug_taken = self
            .tables
            .grants
            .values()
            .any(|existing| existing.slug == grant.slug);
        if slug_taken || self.tables.grants.contains_key(&grant.id) {
            return Err(RepositoryError::Conflict);
        }
        self.tables.grants.insert(grant.id, grant);
        Ok(())
    }

    fn update_grant(&mut self, grant: Grant) -> Result<(), RepositoryError> {
        match self.tables.grants.get_mut(&grant.id) {
            Some(slot) => {
                *slot = grant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables.applications.get(&id).cloned())
    }

    fn application_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .tables
            .applications
            .values()
            .find(|application| application.reference_number.as_str() == reference)
            .cloned())
    }

    fn application_for(
        &self,
        grant_id: GrantId,
        applicant_id: UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .tables
            .applications
            .values()
            .find(|application| {
                application.grant_id == grant_id && application.applicant_id == applicant_id
            })
            .cloned())
    }

    fn applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let grants = &self.tables.grants;
        Ok(self
            .tables
            .applications
            .values()
            .rev()
            .filter(|application| {
                let owner = grants
                    .get(&application.grant_id)
                    .map(|grant| grant.organization_id);
                filter.matches(application, owner)
            })
            .cloned()
            .collect())
    }

    fn next_application_id(&mut self) -> Result<ApplicationId, RepositoryError> {
        self.tables.application_sequence += 1;
        Ok(ApplicationId(self.tables.application_sequence))
    }

    fn insert_application(&mut self, application: Application) -> Result<(), RepositoryError> {
        let duplicate = self.tables.applications.values().any(|existing| {
            existing.id == application.id
                || existing.reference_number == application.reference_number
                || (existing.grant_id == application.grant_id
                    && existing.applicant_id == application.applicant_id)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        self.tables.applications.insert(application.id, application);
        Ok(())
    }

    fn update_application(&mut self, application: Application) -> Result<(), RepositoryError> {
        match self.tables.applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn feature_toggles(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<FeatureToggle>, RepositoryError> {
        Ok(self
            .tables
            .feature_toggles
            .range((organization_id, FeatureKey::FIRST)..=(organization_id, FeatureKey::LAST))
            .map(|(_, toggle)| toggle.clone())
            .collect())
    }

    fn put_feature_toggle(&mut self, toggle: FeatureToggle) -> Result<(), RepositoryError> {
        self.tables
            .feature_toggles
            .insert((toggle.organization_id, toggle.feature_key), toggle);
        Ok(())
    }
}
