use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};

use super::catalog::{Configuration, FeatureDefinition};
use super::domain::{FeatureCheck, FeatureToggle, FeatureUpdate};
use super::service::{FeatureMap, FeatureToggleService};
use super::templates::TemplateDescription;
use crate::access::OrganizationId;
use crate::clock::Clock;
use crate::store::Store;
use crate::workflows::error::WorkflowError;
use crate::workflows::http::require_caller;

type SharedFeatures<S, C> = State<Arc<FeatureToggleService<S, C>>>;

/// Router builder exposing the feature toggle and template endpoints.
pub fn feature_router<S, C>(service: Arc<FeatureToggleService<S, C>>) -> Router
where
    S: Store + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/api/v1/features/catalog", get(catalog_handler::<S, C>))
        .route("/api/v1/features/templates", get(templates_handler::<S, C>))
        .route(
            "/api/v1/features/:organization_id",
            get(list_handler::<S, C>).put(bulk_handler::<S, C>),
        )
        .route(
            "/api/v1/features/:organization_id/:feature_key",
            get(check_handler::<S, C>).put(set_handler::<S, C>),
        )
        .route(
            "/api/v1/features/:organization_id/:feature_key/config",
            put(configuration_handler::<S, C>),
        )
        .route(
            "/api/v1/features/:organization_id/apply-template/:template",
            post(template_handler::<S, C>),
        )
        .with_state(service)
}

pub(crate) async fn catalog_handler<S, C>(
    State(service): SharedFeatures<S, C>,
) -> Json<&'static [FeatureDefinition]>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    Json(service.catalog())
}

pub(crate) async fn templates_handler<S, C>(
    State(service): SharedFeatures<S, C>,
) -> Json<Vec<TemplateDescription>>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    Json(service.templates())
}

pub(crate) async fn list_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path(organization_id): Path<u64>,
) -> Result<Json<FeatureMap>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(
        service.get_features(&caller, OrganizationId(organization_id))?,
    ))
}

pub(crate) async fn bulk_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path(organization_id): Path<u64>,
    Json(updates): Json<BTreeMap<String, FeatureUpdate>>,
) -> Result<Json<FeatureMap>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.bulk_update(
        &caller,
        OrganizationId(organization_id),
        updates,
    )?))
}

pub(crate) async fn check_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path((organization_id, feature_key)): Path<(u64, String)>,
) -> Result<Json<FeatureCheck>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.check(
        &caller,
        OrganizationId(organization_id),
        &feature_key,
    )?))
}

pub(crate) async fn set_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path((organization_id, feature_key)): Path<(u64, String)>,
    Json(update): Json<FeatureUpdate>,
) -> Result<Json<FeatureToggle>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.set_feature(
        &caller,
        OrganizationId(organization_id),
        &feature_key,
        update,
    )?))
}

pub(crate) async fn configuration_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path((organization_id, feature_key)): Path<(u64, String)>,
    Json(configuration): Json<Configuration>,
) -> Result<Json<FeatureToggle>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.update_configuration(
        &caller,
        OrganizationId(organization_id),
        &feature_key,
        configuration,
    )?))
}

pub(crate) async fn template_handler<S, C>(
    State(service): SharedFeatures<S, C>,
    headers: HeaderMap,
    Path((organization_id, template)): Path<(u64, String)>,
) -> Result<Json<FeatureMap>, WorkflowError>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    let caller = require_caller(&headers)?;
    Ok(Json(service.apply_template(
        &caller,
        OrganizationId(organization_id),
        &template,
    )?))
}
