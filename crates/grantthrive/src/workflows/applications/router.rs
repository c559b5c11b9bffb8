use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{Application, ApplicationId, ApplicationReview, ApplicationUpdate, NewApplication};
use super::query::{ApplicationQuery, ApplicationStats};
use super::service::ApplicationService;
use crate::access::OrganizationId;
use crate::clock::Clock;
use crate::store::Store;
use crate::workflows::error::WorkflowError;
use crate::workflows::http::require_caller;
use crate::workflows::pagination::Page;

type SharedApplications<S, C> = State<Arc<ApplicationService<S, C>>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatsQuery {
    organization_id: Option<OrganizationId>,
}

/// Router builder exposing the application workflow endpoints.
pub fn application_router<S, C>(service: Arc<ApplicationService<S, C>>) -> Router
where
    S: Store + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(create_handler::<S, C>).get(list_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S, C>).put(update_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/reference/:reference",
            get(reference_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/stats/summary",
            get(stats_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler::<S, C>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Json(payload): Json<NewApplication>,
) -> Result<(StatusCode, Json<Application>), WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    let application = service.create(&caller, payload)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn list_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Query(query): Query<ApplicationQuery>,
) -> Result<Json<Page<Application>>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.list(&caller, query)?))
}

pub(crate) async fn get_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.get(&caller, ApplicationId(application_id))?))
}

pub(crate) async fn reference_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.get_by_reference(&caller, &reference)?))
}

pub(crate) async fn update_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    Json(update): Json<ApplicationUpdate>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.update(
        &caller,
        ApplicationId(application_id),
        update,
    )?))
}

pub(crate) async fn submit_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.submit(&caller, ApplicationId(application_id))?))
}

pub(crate) async fn review_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    Json(decision): Json<ApplicationReview>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.review(
        &caller,
        ApplicationId(application_id),
        decision,
    )?))
}

pub(crate) async fn withdraw_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Json<Application>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.withdraw(&caller, ApplicationId(application_id))?))
}

pub(crate) async fn stats_handler<S, C>(
    State(service): SharedApplications<S, C>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApplicationStats>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.stats(&caller, query.organization_id)?))
}
