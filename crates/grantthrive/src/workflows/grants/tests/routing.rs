use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::grants::grant_router;
use crate::workflows::testing::{
    applicant, client_admin, expect_status, request, Harness,
};

fn grant_payload() -> serde_json::Value {
    json!({
        "title": "Community Arts Fund",
        "description": "Support for community-led arts projects",
        "category": "arts_culture",
        "total_funding": "50000.00",
        "min_amount": 1000,
        "max_amount": "5000",
        "application_open_date": "2025-01-01T00:00:00Z",
        "application_close_date": "2025-01-31T23:59:59Z",
        "organization_id": 7
    })
}

#[tokio::test]
async fn create_route_returns_created_draft() {
    let harness = Harness::new();
    let router = grant_router(harness.grants.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/grants",
            Some(&client_admin()),
            Some(grant_payload()),
        ))
        .await
        .expect("route executes");

    let body = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(body["status"], "draft");
    assert_eq!(body["slug"], "community-arts-fund");
    assert_eq!(body["max_amount"], "5000.00");
}

#[tokio::test]
async fn anonymous_create_is_forbidden() {
    let harness = Harness::new();
    let router = grant_router(harness.grants.clone());

    let response = router
        .oneshot(request("POST", "/api/v1/grants", None, Some(grant_payload())))
        .await
        .expect("route executes");

    let body = expect_status(response, StatusCode::FORBIDDEN).await;
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn republishing_maps_to_conflict() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");
    let router = grant_router(harness.grants.clone());

    let uri = format!("/api/v1/grants/{}/publish", grant.id);
    let response = router
        .oneshot(request("POST", &uri, Some(&client_admin()), None))
        .await
        .expect("route executes");

    let body = expect_status(response, StatusCode::CONFLICT).await;
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn drafts_read_as_missing_for_anonymous_callers() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");
    let router = grant_router(harness.grants.clone());

    let uri = format!("/api/v1/grants/slug/{}", grant.slug);
    let response = router
        .clone()
        .oneshot(request("GET", &uri, None, None))
        .await
        .expect("route executes");
    expect_status(response, StatusCode::NOT_FOUND).await;

    let response = router
        .oneshot(request("GET", &uri, Some(&applicant(40)), None))
        .await
        .expect("route executes");
    expect_status(response, StatusCode::FORBIDDEN).await;
}

#[tokio::test]
async fn list_route_applies_query_filters() {
    let harness = Harness::new();
    harness.published("Heritage Fund");
    harness.published("Sports Fund");
    let router = grant_router(harness.grants.clone());

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/grants?search=heritage&limit=10",
            None,
            None,
        ))
        .await
        .expect("route executes");

    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["items"][0]["title"], "Heritage Fund");
}

#[tokio::test]
async fn malformed_identity_headers_are_rejected() {
    let harness = Harness::new();
    let router = grant_router(harness.grants.clone());

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/grants")
                .header(crate::workflows::http::USER_ID_HEADER, "abc")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    expect_status(response, StatusCode::UNPROCESSABLE_ENTITY).await;
}
