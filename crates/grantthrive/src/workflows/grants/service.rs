use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{slugify, validate_terms, Grant, GrantId, GrantStatus, GrantUpdate, NewGrant};
use super::lifecycle::{ensure_deletable, transition, GrantAction};
use super::query::{GrantFilter, GrantQuery};
use crate::access::{self, Caller, GrantVisibility};
use crate::clock::Clock;
use crate::store::{Store, StoreTransaction};
use crate::workflows::error::{Entity, WorkflowError};
use crate::workflows::pagination::{ListingConfig, Page};

/// Service owning every write to grant rows.
pub struct GrantService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    listing: ListingConfig,
}

impl<S, C> GrantService<S, C>
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

    /// Create a draft grant for an organization the caller manages.
    pub fn create(&self, caller: &Caller, new: NewGrant) -> Result<Grant, WorkflowError> {
        if !access::can_manage_grants(caller, new.organization_id) {
            warn!(user_id = %caller.user_id, organization_id = %new.organization_id, "grant creation refused");
            return Err(WorkflowError::Forbidden(
                "can only create grants for your own organization",
            ));
        }
        validate_terms(
            &new.title,
            new.total_funding,
            new.min_amount,
            new.max_amount,
            new.application_open_date,
            new.application_close_date,
        )?;

        let now = self.clock.now();
        let grant = self.store.transaction(|tx| {
            let slug = unique_slug(tx, &new.title)?;
            let id = tx.next_grant_id()?;
            let grant = Grant {
                id,
                title: new.title.trim().to_string(),
                slug,
                description: new.description,
                status: GrantStatus::Draft,
                category: new.category,
                tags: new.tags,
                is_featured: new.is_featured,
                total_funding: new.total_funding,
                min_amount: new.min_amount,
                max_amount: new.max_amount,
                application_open_date: new.application_open_date,
                application_close_date: new.application_close_date,
                organization_id: new.organization_id,
                created_by: caller.user_id,
                view_count: 0,
                application_count: 0,
                created_at: now,
                updated_at: now,
            };
            tx.insert_grant(grant.clone())?;
            Ok::<_, WorkflowError>(grant)
        })?;

        info!(grant_id = %grant.id, slug = %grant.slug, organization_id = %grant.organization_id, "grant drafted");
        Ok(grant)
    }

    /// Fetch a grant under the visibility rule, counting views of published grants.
    pub fn get(&self, caller: Option<&Caller>, id: GrantId) -> Result<Grant, WorkflowError> {
        self.store.transaction(|tx| {
            let grant = tx
                .grant(id)?
                .ok_or_else(|| WorkflowError::not_found(Entity::Grant, id))?;
            record_view(tx, caller, grant)
        })
    }

    pub fn get_by_slug(&self, caller: Option<&Caller>, slug: &str) -> Result<Grant, WorkflowError> {
        self.store.transaction(|tx| {
            let grant = tx
                .grant_by_slug(slug)?
                .ok_or_else(|| WorkflowError::not_found(Entity::Grant, slug))?;
            record_view(tx, caller, grant)
        })
    }

    /// Filtered, paginated listing narrowed by the caller's visibility.
    pub fn list(
        &self,
        caller: Option<&Caller>,
        mut query: GrantQuery,
    ) -> Result<Page<Grant>, WorkflowError> {
        if access::sees_only_published(caller) {
            query.status = Some(GrantStatus::Published);
        } else if let Some(caller) = caller {
            if caller.role.is_client_user() && query.organization_id.is_none() {
                query.organization_id = caller.organization_id;
            }
            if let Some(organization) = query.organization_id {
                if !caller.is_super_admin() && !caller.is_member_of(organization) {
                    query.status = Some(GrantStatus::Published);
                }
            } else if !caller.is_super_admin() {
                query.status = Some(GrantStatus::Published);
            }
        }

        let filter = GrantFilter::from_query(&query, self.clock.now());
        let limit = self.listing.clamp_limit(query.limit);
        let rows = self.store.transaction(|tx| tx.grants(&filter))?;
        Ok(Page::from_rows(rows, query.skip, limit))
    }

    /// Edit metadata, re-checking the window and funding invariants.
    pub fn update(
        &self,
        caller: &Caller,
        id: GrantId,
        update: GrantUpdate,
    ) -> Result<Grant, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let mut grant = self.authorized_grant(tx, caller, id, |caller, grant| {
                access::can_manage_grants(caller, grant.organization_id)
            })?;
            if grant.status == GrantStatus::Archived {
                return Err(WorkflowError::InvalidTransition {
                    entity: Entity::Grant,
                    action: "update",
                    status: grant.status.label(),
                });
            }

            update.apply_to(&mut grant);
            validate_terms(
                &grant.title,
                grant.total_funding,
                grant.min_amount,
                grant.max_amount,
                grant.application_open_date,
                grant.application_close_date,
            )?;
            grant.updated_at = now;
            tx.update_grant(grant.clone())?;

            info!(grant_id = %grant.id, "grant updated");
            Ok(grant)
        })
    }

    pub fn publish(&self, caller: &Caller, id: GrantId) -> Result<Grant, WorkflowError> {
        self.apply(caller, id, GrantAction::Publish)
    }

    pub fn close(&self, caller: &Caller, id: GrantId) -> Result<Grant, WorkflowError> {
        self.apply(caller, id, GrantAction::Close)
    }

    /// Soft delete; allowed from every status.
    pub fn archive(&self, caller: &Caller, id: GrantId) -> Result<Grant, WorkflowError> {
        self.apply(caller, id, GrantAction::Archive)
    }

    /// Delete request: refused for published grants with applications,
    /// otherwise archived.
    pub fn delete(&self, caller: &Caller, id: GrantId) -> Result<Grant, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let mut grant = self.authorized_grant(tx, caller, id, access::can_archive)?;
            if let Err(reason) = ensure_deletable(&grant) {
                warn!(grant_id = %grant.id, applications = grant.application_count, "grant delete refused");
                return Err(reason.into());
            }
            self.commit_transition(tx, &mut grant, GrantAction::Archive, now)?;
            Ok(grant)
        })
    }

    fn apply(
        &self,
        caller: &Caller,
        id: GrantId,
        action: GrantAction,
    ) -> Result<Grant, WorkflowError> {
        let now = self.clock.now();
        self.store.transaction(|tx| {
            let mut grant = self.authorized_grant(tx, caller, id, action.permission())?;
            self.commit_transition(tx, &mut grant, action, now)?;
            Ok(grant)
        })
    }

    fn commit_transition(
        &self,
        tx: &mut dyn StoreTransaction,
        grant: &mut Grant,
        action: GrantAction,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), WorkflowError> {
        let from = match transition(grant, action) {
            Ok(from) => from,
            Err(err) => {
                warn!(grant_id = %grant.id, action = action.label(), status = grant.status.label(), "grant transition rejected");
                return Err(err);
            }
        };
        grant.updated_at = now;
        tx.update_grant(grant.clone())?;

        info!(
            grant_id = %grant.id,
            from = from.label(),
            to = grant.status.label(),
            "grant status changed"
        );
        Ok(())
    }

    fn authorized_grant(
        &self,
        tx: &mut dyn StoreTransaction,
        caller: &Caller,
        id: GrantId,
        allowed: fn(&Caller, &Grant) -> bool,
    ) -> Result<Grant, WorkflowError> {
        let grant = tx
            .grant(id)?
            .ok_or_else(|| WorkflowError::not_found(Entity::Grant, id))?;
        if !allowed(caller, &grant) {
            warn!(user_id = %caller.user_id, grant_id = %grant.id, "grant mutation refused");
            return Err(WorkflowError::Forbidden("access to this grant not allowed"));
        }
        Ok(grant)
    }
}

fn record_view(
    tx: &mut dyn StoreTransaction,
    caller: Option<&Caller>,
    mut grant: Grant,
) -> Result<Grant, WorkflowError> {
    match access::grant_visibility(caller, &grant) {
        GrantVisibility::Visible => {}
        GrantVisibility::Hidden => return Err(WorkflowError::not_found(Entity::Grant, grant.id)),
        GrantVisibility::Denied => {
            return Err(WorkflowError::Forbidden("access to this grant not allowed"))
        }
    }

    if grant.status == GrantStatus::Published {
        grant.view_count += 1;
        tx.update_grant(grant.clone())?;
    }
    Ok(grant)
}

fn unique_slug(tx: &mut dyn StoreTransaction, title: &str) -> Result<String, WorkflowError> {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut counter = 1;
    while tx.grant_by_slug(&candidate)?.is_some() {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    Ok(candidate)
}
