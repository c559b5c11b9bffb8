use std::sync::Arc;

use chrono::Datelike;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationReview, ApplicationStatus, ApplicationUpdate,
    NewApplication, ReferenceNumber,
};
use super::lifecycle::{self, check_requested_amount, ensure_editable};
use super::query::{ApplicationFilter, ApplicationQuery, ApplicationStats};
use crate::access::{self, Caller, OrganizationId, Role};
use crate::clock::Clock;
use crate::store::{Store, StoreTransaction};
use crate::workflows::error::{ConflictReason, Entity, WorkflowError};
use crate::workflows::grants::Grant;
use crate::workflows::pagination::{ListingConfig, Page};

/// Service owning every write to application rows and the grant counters
/// they drive.
pub struct ApplicationService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    listing: ListingConfig,
}

impl<S, C> ApplicationService<S, C>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, listing: ListingConfig) -> Self {
        Self {
            store,
            clock,
            listing,
        }
    }

    /// Create a draft application against an open grant, bumping the grant's
    /// application counter in the same transaction.
    pub fn create(
        &self,
        caller: &Caller,
        new: NewApplication,
    ) -> Result<Application, WorkflowError> {
        if new.project_title.trim().is_empty() {
            return Err(WorkflowError::validation("project_title must not be empty"));
        }
        if new.requested_amount.is_zero() {
            return Err(WorkflowError::validation(
                "requested_amount must be greater than zero",
            ));
        }

        let now = self.clock.now();
        let application: Result<Application, WorkflowError> = self.store.transaction(|tx| {
            let mut grant = tx
                .grant(new.grant_id)?
                .ok_or_else(|| WorkflowError::not_found(Entity::Grant, new.grant_id))?;
            if !grant.is_open(now) {
                return Err(WorkflowError::ApplicationWindowClosed { grant_id: grant.id });
            }
            if tx.application_for(grant.id, caller.user_id)?.is_some() {
                return Err(ConflictReason::DuplicateApplication { grant_id: grant.id }.into());
            }
            check_requested_amount(&grant, new.requested_amount)?;

            let id = tx.next_application_id()?;
            let application = Application {
                id,
                reference_number: ReferenceNumber::assign(now.year(), grant.id, id),
                status: ApplicationStatus::Draft,
                grant_id: grant.id,
                applicant_id: caller.user_id,
                project_title: new.project_title.trim().to_string(),
                project_description: new.project_description,
                requested_amount: new.requested_amount,
                score: None,
                reviewer_notes: None,
                feedback: None,
                reviewed_by: None,
                reviewed_at: None,
                submitted_at: None,
                withdrawn_at: None,
                created_at: now,
                updated_at: now,
            };
            tx.insert_application(application.clone())?;

            grant.application_count += 1;
            grant.updated_at = now;
            tx.update_grant(grant)?;
            Ok(application)
        });

        match &application {
            Ok(application) => info!(
                application_id = %application.id,
                reference = %application.reference_number,
                grant_id = %application.grant_id,
                "application drafted"
            ),
            Err(err) => warn!(
                user_id = %caller.user_id,
                grant_id = %new.grant_id,
                error = %err,
                "application refused"
            ),
        }
        application
    }

    pub fn submit(&self, caller: &Caller, id: ApplicationId) -> Result<Application, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let (mut application, grant) = load(tx, id)?;
            let from = application.status;
            if let Err(err) = lifecycle::submit(&mut application, &grant, caller, now) {
                warn!(application_id = %id, status = from.label(), error = %err, "submission rejected");
                return Err(err);
            }
            tx.update_application(application.clone())?;
            log_transition(&application, from);
            Ok(application)
        })
    }

    /// Record a reviewer decision on behalf of the grant's organization.
    pub fn review(
        &self,
        caller: &Caller,
        id: ApplicationId,
        decision: ApplicationReview,
    ) -> Result<Application, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let (mut application, grant) = load(tx, id)?;
            if !access::can_review(caller, &grant) {
                warn!(user_id = %caller.user_id, application_id = %id, "review refused");
                return Err(WorkflowError::Forbidden(
                    "can only review applications for your organization's grants",
                ));
            }
            let from = application.status;
            if let Err(err) = lifecycle::review(&mut application, caller, decision, now) {
                warn!(application_id = %id, status = from.label(), error = %err, "review rejected");
                return Err(err);
            }
            tx.update_application(application.clone())?;
            log_transition(&application, from);
            Ok(application)
        })
    }

    pub fn withdraw(
        &self,
        caller: &Caller,
        id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let (mut application, _) = load(tx, id)?;
            let from = application.status;
            lifecycle::withdraw(&mut application, caller, now)?;
            tx.update_application(application.clone())?;
            log_transition(&application, from);
            Ok(application)
        })
    }

    /// Edit a draft. A new requested amount is checked against the grant's
    /// current bounds.
    pub fn update(
        &self,
        caller: &Caller,
        id: ApplicationId,
        update: ApplicationUpdate,
    ) -> Result<Application, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let (mut application, grant) = load(tx, id)?;
            ensure_editable(&application, caller)?;

            if let Some(title) = update.project_title {
                if title.trim().is_empty() {
                    return Err(WorkflowError::validation("project_title must not be empty"));
                }
                application.project_title = title.trim().to_string();
            }
            if let Some(description) = update.project_description {
                application.project_description = description;
            }
            if let Some(amount) = update.requested_amount {
                check_requested_amount(&grant, amount)?;
                application.requested_amount = amount;
            }
            application.updated_at = now;
            tx.update_application(application.clone())?;
            Ok(application)
        })
    }

    pub fn get(&self, caller: &Caller, id: ApplicationId) -> Result<Application, WorkflowError> {
        self.store.transaction(|tx| {
            let (application, grant) = load(tx, id)?;
            visible_to(caller, application, &grant)
        })
    }

    pub fn get_by_reference(
        &self,
        caller: &Caller,
        reference: &str,
    ) -> Result<Application, WorkflowError> {
        self.store.transaction(|tx| {
            let application = tx
                .application_by_reference(reference)?
                .ok_or_else(|| WorkflowError::not_found(Entity::Application, reference))?;
            let grant = owning_grant(tx, &application)?;
            visible_to(caller, application, &grant)
        })
    }

    /// Paginated listing scoped by role: applicants see their own rows,
    /// organization staff see their organization's grants.
    pub fn list(
        &self,
        caller: &Caller,
        query: ApplicationQuery,
    ) -> Result<Page<Application>, WorkflowError> {
        let mut filter = ApplicationFilter {
            status: query.status,
            grant_id: query.grant_id,
            ..ApplicationFilter::default()
        };
        match caller.role {
            Role::SuperAdmin => {}
            Role::ClientAdmin | Role::ClientUser => match caller.organization_id {
                Some(organization) => filter.organization_id = Some(organization),
                None => filter.applicant_id = Some(caller.user_id),
            },
            Role::Applicant | Role::Professional => filter.applicant_id = Some(caller.user_id),
        }

        let limit = self.listing.clamp_limit(query.limit);
        let rows = self.store.transaction(|tx| tx.applications(&filter))?;
        Ok(Page::from_rows(rows, query.skip, limit))
    }

    /// Status totals for administrators. Client admins are pinned to their own
    /// organization whatever they ask for.
    pub fn stats(
        &self,
        caller: &Caller,
        organization: Option<OrganizationId>,
    ) -> Result<ApplicationStats, WorkflowError> {
        if !access::can_view_statistics(caller) {
            return Err(WorkflowError::Forbidden(
                "application statistics require an administrator",
            ));
        }
        let organization_id = if caller.is_super_admin() {
            organization
        } else {
            match caller.organization_id {
                Some(own) => Some(own),
                None => {
                    return Err(WorkflowError::Forbidden(
                        "administrator is not attached to an organization",
                    ))
                }
            }
        };

        let filter = ApplicationFilter {
            organization_id,
            ..ApplicationFilter::default()
        };
        let rows = self.store.transaction(|tx| tx.applications(&filter))?;
        Ok(ApplicationStats::tally(&rows))
    }
}

fn load(
    tx: &mut dyn StoreTransaction,
    id: ApplicationId,
) -> Result<(Application, Grant), WorkflowError> {
    let application = tx
        .application(id)?
        .ok_or_else(|| WorkflowError::not_found(Entity::Application, id))?;
    let grant = owning_grant(tx, &application)?;
    Ok((application, grant))
}

fn owning_grant(
    tx: &mut dyn StoreTransaction,
    application: &Application,
) -> Result<Grant, WorkflowError> {
    tx.grant(application.grant_id)?
        .ok_or_else(|| WorkflowError::not_found(Entity::Grant, application.grant_id))
}

fn visible_to(
    caller: &Caller,
    application: Application,
    grant: &Grant,
) -> Result<Application, WorkflowError> {
    if access::can_view_application(caller, &application, grant) {
        Ok(application)
    } else {
        Err(WorkflowError::Forbidden("access to this application not allowed"))
    }
}

fn log_transition(application: &Application, from: ApplicationStatus) {
    info!(
        application_id = %application.id,
        reference = %application.reference_number,
        from = from.label(),
        to = application.status.label(),
        "application status changed"
    );
}
