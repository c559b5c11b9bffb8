//! Fixtures shared by the unit tests of every workflow module.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::applications::{ApplicationService, NewApplication};
use super::features::FeatureToggleService;
use super::grants::{Grant, GrantCategory, GrantId, GrantService, GrantStatus, NewGrant};
use super::http::{ORGANIZATION_HEADER, ROLE_HEADER, USER_ID_HEADER};
use super::pagination::ListingConfig;
use crate::access::{Caller, OrganizationId, Role, UserId};
use crate::clock::FixedClock;
use crate::money::Amount;
use crate::store::MemoryStore;

pub(crate) const COUNCIL: OrganizationId = OrganizationId(7);
pub(crate) const OTHER_COUNCIL: OrganizationId = OrganizationId(9);

pub(crate) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid fixture date")
}

/// Middle of the fixture grant's application window.
pub(crate) fn mid_window() -> DateTime<Utc> {
    at(2025, 1, 15)
}

pub(crate) fn super_admin() -> Caller {
    Caller::new(UserId(1), Role::SuperAdmin, None)
}

pub(crate) fn client_admin() -> Caller {
    Caller::new(UserId(2), Role::ClientAdmin, Some(COUNCIL))
}

pub(crate) fn client_user() -> Caller {
    Caller::new(UserId(3), Role::ClientUser, Some(COUNCIL))
}

pub(crate) fn outsider_staff() -> Caller {
    Caller::new(UserId(4), Role::ClientAdmin, Some(OTHER_COUNCIL))
}

pub(crate) fn applicant(id: u64) -> Caller {
    Caller::new(UserId(id), Role::Applicant, None)
}

pub(crate) fn new_grant(title: &str) -> NewGrant {
    NewGrant {
        title: title.to_string(),
        description: "Support for community-led arts projects".to_string(),
        category: GrantCategory::ArtsCulture,
        tags: vec!["arts".to_string()],
        is_featured: false,
        total_funding: Amount::from_units(50_000),
        min_amount: Some(Amount::from_units(1_000)),
        max_amount: Some(Amount::from_units(5_000)),
        application_open_date: at(2025, 1, 1),
        application_close_date: at(2025, 1, 31),
        organization_id: COUNCIL,
    }
}

/// Unsaved draft with the same terms as [`new_grant`].
pub(crate) fn draft_grant() -> Grant {
    let new = new_grant("Community Arts Fund");
    Grant {
        id: GrantId(1),
        title: new.title,
        slug: "community-arts-fund".to_string(),
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
        created_by: client_admin().user_id,
        view_count: 0,
        application_count: 0,
        created_at: at(2024, 12, 20),
        updated_at: at(2024, 12, 20),
    }
}

pub(crate) fn new_application(grant_id: GrantId, units: u64) -> NewApplication {
    NewApplication {
        grant_id,
        project_title: "Mural on Main Street".to_string(),
        project_description: "Community mural with local artists".to_string(),
        requested_amount: Amount::from_units(units),
    }
}

/// Services wired to one store and one manually driven clock.
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub grants: Arc<GrantService<MemoryStore, FixedClock>>,
    pub applications: Arc<ApplicationService<MemoryStore, FixedClock>>,
    pub features: Arc<FeatureToggleService<MemoryStore, FixedClock>>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(mid_window()));
        let listing = ListingConfig::default();
        Self {
            grants: Arc::new(GrantService::new(store.clone(), clock.clone(), listing)),
            applications: Arc::new(ApplicationService::new(
                store.clone(),
                clock.clone(),
                listing,
            )),
            features: Arc::new(FeatureToggleService::new(store.clone(), clock.clone())),
            store,
            clock,
        }
    }

    /// Draft created by the council admin.
    pub(crate) fn draft(&self, title: &str) -> Grant {
        self.grants
            .create(&client_admin(), new_grant(title))
            .expect("fixture grant is valid")
    }

    /// Published grant whose window contains the harness clock.
    pub(crate) fn published(&self, title: &str) -> Grant {
        let grant = self.draft(title);
        self.grants
            .publish(&client_admin(), grant.id)
            .expect("draft publishes")
    }
}

pub(crate) fn request(method: &str, uri: &str, caller: Option<&Caller>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header(USER_ID_HEADER, caller.user_id.to_string())
            .header(ROLE_HEADER, caller.role.label());
        if let Some(organization) = caller.organization_id {
            builder = builder.header(ORGANIZATION_HEADER, organization.to_string());
        }
    }
    match body {
        Some(body) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) async fn expect_status(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    read_json_body(response).await
}
