use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use super::domain::{Grant, GrantId, GrantUpdate, NewGrant};
use super::query::GrantQuery;
use super::service::GrantService;
use crate::clock::Clock;
use crate::store::Store;
use crate::workflows::error::WorkflowError;
use crate::workflows::http::{caller_from_headers, require_caller};
use crate::workflows::pagination::Page;

type SharedGrants<S, C> = State<Arc<GrantService<S, C>>>;

/// Router builder exposing grant CRUD and lifecycle endpoints.
pub fn grant_router<S, C>(service: Arc<GrantService<S, C>>) -> Router
where
    S: Store + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/api/v1/grants",
            post(create_handler::<S, C>).get(list_handler::<S, C>),
        )
        .route(
            "/api/v1/grants/:grant_id",
            get(get_handler::<S, C>)
                .put(update_handler::<S, C>)
                .delete(delete_handler::<S, C>),
        )
        .route("/api/v1/grants/slug/:slug", get(slug_handler::<S, C>))
        .route(
            "/api/v1/grants/:grant_id/publish",
            post(publish_handler::<S, C>),
        )
        .route("/api/v1/grants/:grant_id/close", post(close_handler::<S, C>))
        .route(
            "/api/v1/grants/:grant_id/archive",
            post(archive_handler::<S, C>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Json(payload): Json<NewGrant>,
) -> Result<(StatusCode, Json<Grant>), WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    let grant = service.create(&caller, payload)?;
    Ok((StatusCode::CREATED, Json(grant)))
}

pub(crate) async fn list_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Query(query): Query<GrantQuery>,
) -> Result<Json<Page<Grant>>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = caller_from_headers(&headers)?;
    Ok(Json(service.list(caller.as_ref(), query)?))
}

pub(crate) async fn get_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = caller_from_headers(&headers)?;
    Ok(Json(service.get(caller.as_ref(), GrantId(grant_id))?))
}

pub(crate) async fn slug_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = caller_from_headers(&headers)?;
    Ok(Json(service.get_by_slug(caller.as_ref(), &slug)?))
}

pub(crate) async fn update_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
    Json(update): Json<GrantUpdate>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.update(&caller, GrantId(grant_id), update)?))
}

pub(crate) async fn delete_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.delete(&caller, GrantId(grant_id))?))
}

pub(crate) async fn publish_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.publish(&caller, GrantId(grant_id))?))
}

pub(crate) async fn close_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.close(&caller, GrantId(grant_id))?))
}

pub(crate) async fn archive_handler<S, C>(
    State(service): SharedGrants<S, C>,
    headers: HeaderMap,
    Path(grant_id): Path<u64>,
) -> Result<Json<Grant>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.archive(&caller, GrantId(grant_id))?))
}
