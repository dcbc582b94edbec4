// tests/integration/scenario_tests.rs

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{app_helper, auth_helper, request};

#[tokio::test]
async fn test_scenario_crud() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/scenarios",
        &user.access_token,
        Some(json!({
            "organizationId": "org-lakeside",
            "title": "Consolidate advising",
            "baselineData": { "roles": [] },
            "variantData": { "roles": [] }
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["status"], "DRAFT");
    let scenario_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = request::create_authenticated_request(
        "GET",
        "/api/scenarios?organization_id=org-lakeside",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // 作成者以外は参照できない
    let other = auth_helper::create_user(&app.state);
    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/scenarios/{}", scenario_id),
        &other.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = request::create_authenticated_request(
        "DELETE",
        &format!("/api/scenarios/{}", scenario_id),
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/scenarios/{}", scenario_id),
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scenario_create_validation() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/scenarios",
        &user.access_token,
        Some(json!({
            "organizationId": "org-lakeside",
            "title": "",
            "baselineData": {},
            "variantData": {}
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_status_filter_is_bad_request() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        "/api/scenarios?status=ARCHIVED_FOREVER",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/scenarios/{}/roi", Uuid::new_v4()),
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roi_calculation_uses_requested_horizon() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/scenarios",
        &user.access_token,
        Some(json!({
            "organizationId": "org-lakeside",
            "title": "Shared services",
            "baselineData": { "costStructure": { "totalAnnualCost": 1_000_000.0 } },
            "variantData": {
                "proposedCostStructure": { "totalAnnualCost": 800_000.0 },
                "implementationPlan": [{ "id": "s1", "phase": 1, "duration": 4, "cost": 50_000.0 }]
            }
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let scenario_id = request::body_json(res).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/scenarios/{}/roi", scenario_id);

    // 18 か月は 2 年として扱う
    let req = request::create_authenticated_request(
        "POST",
        &uri,
        &user.access_token,
        Some(json!({ "timeHorizon": 18 })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["analysis"]["assumptions"]["timeHorizon"], 2);

    let req = request::create_authenticated_request(
        "POST",
        &uri,
        &user.access_token,
        Some(json!({ "assumptions": { "timeHorizon": 4 } })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["analysis"]["assumptions"]["timeHorizon"], 4);

    let req = request::create_authenticated_request("GET", &uri, &user.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
