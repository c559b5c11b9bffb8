use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use grantthrive::clock::FixedClock;
use grantthrive::store::MemoryStore;
use grantthrive::workflows::applications::{application_router, ApplicationService};
use grantthrive::workflows::features::{feature_router, FeatureToggleService};
use grantthrive::workflows::grants::{grant_router, GrantService};
use grantthrive::workflows::http::{ORGANIZATION_HEADER, ROLE_HEADER, USER_ID_HEADER};
use grantthrive::workflows::ListingConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct Identity {
    user_id: u64,
    role: &'static str,
    organization_id: Option<u64>,
}

const ADMIN: Identity = Identity {
    user_id: 2,
    role: "client_admin",
    organization_id: Some(7),
};

const ALICE: Identity = Identity {
    user_id: 20,
    role: "applicant",
    organization_id: None,
};

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let instant = Utc
        .with_ymd_and_hms(2025, 1, 15, 12, 0, 0)
        .single()
        .expect("valid date");
    let clock = Arc::new(FixedClock::new(instant));
    let listing = ListingConfig::default();

    grant_router(Arc::new(GrantService::new(
        store.clone(),
        clock.clone(),
        listing,
    )))
    .merge(application_router(Arc::new(ApplicationService::new(
        store.clone(),
        clock.clone(),
        listing,
    ))))
    .merge(feature_router(Arc::new(FeatureToggleService::new(
        store, clock,
    ))))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    identity: Option<&Identity>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder
            .header(USER_ID_HEADER, identity.user_id.to_string())
            .header(ROLE_HEADER, identity.role);
        if let Some(organization) = identity.organization_id {
            builder = builder.header(ORGANIZATION_HEADER, organization.to_string());
        }
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn arts_fund() -> Value {
    json!({
        "title": "Community Arts Fund",
        "category": "arts_culture",
        "total_funding": 50000,
        "min_amount": 1000,
        "max_amount": 5000,
        "application_open_date": "2025-01-01T00:00:00Z",
        "application_close_date": "2025-01-31T23:59:59Z",
        "organization_id": 7
    })
}

#[tokio::test]
async fn grant_to_approved_application_over_http() {
    let app = app();

    let (status, grant) = call(&app, Method::POST, "/api/v1/grants", Some(&ADMIN), Some(arts_fund())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(grant["status"], "draft");
    let grant_id = grant["id"].as_u64().expect("grant id");

    let publish = format!("/api/v1/grants/{grant_id}/publish");
    let (status, published) = call(&app, Method::POST, &publish, Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "published");

    let (status, error) = call(&app, Method::POST, &publish, Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "invalid_transition");

    let (status, error) = call(
        &app,
        Method::POST,
        "/api/v1/applications",
        Some(&ALICE),
        Some(json!({ "grant_id": grant_id, "project_title": "Mural trail", "requested_amount": 6000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "conflict");

    let (status, application) = call(
        &app,
        Method::POST,
        "/api/v1/applications",
        Some(&ALICE),
        Some(json!({ "grant_id": grant_id, "project_title": "Mural trail", "requested_amount": 3000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["reference_number"], "GT20250001000001");
    assert_eq!(application["requested_amount"], "3000.00");
    let application_id = application["id"].as_u64().expect("application id");

    let (status, submitted) = call(
        &app,
        Method::POST,
        &format!("/api/v1/applications/{application_id}/submit"),
        Some(&ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "submitted");

    let (status, reviewed) = call(
        &app,
        Method::POST,
        &format!("/api/v1/applications/{application_id}/review"),
        Some(&ADMIN),
        Some(json!({ "status": "approved", "score": 90 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
    assert_eq!(reviewed["score"], 90);

    let (status, stats) = call(&app, Method::GET, "/api/v1/applications/stats/summary", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["approved_applications"], 1);
    assert_eq!(stats["approval_rate"], 100.0);
}

#[tokio::test]
async fn anonymous_callers_are_limited() {
    let app = app();
    let (status, _) = call(&app, Method::POST, "/api/v1/grants", None, Some(arts_fund())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, grant) = call(&app, Method::POST, "/api/v1/grants", Some(&ADMIN), Some(arts_fund())).await;
    assert_eq!(status, StatusCode::CREATED);
    let grant_id = grant["id"].as_u64().expect("grant id");

    let (status, body) = call(&app, Method::GET, &format!("/api/v1/grants/{grant_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, page) = call(&app, Method::GET, "/api/v1/grants", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn feature_template_over_http() {
    let app = app();

    let (status, _) = call(&app, Method::POST, "/api/v1/features/7/apply-template/standard", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, forums) = call(&app, Method::GET, "/api/v1/features/7/forums", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forums["enabled"], false);

    let (status, networking) = call(&app, Method::GET, "/api/v1/features/7/networking", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(networking["enabled"], true);

    let (status, error) = call(&app, Method::POST, "/api/v1/features/7/apply-template/reckless", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["kind"], "not_found");

    let (status, error) = call(&app, Method::POST, "/api/v1/features/7/apply-template/standard", Some(&ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["kind"], "forbidden");
}
