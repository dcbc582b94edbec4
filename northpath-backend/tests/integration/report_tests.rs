// tests/integration/report_tests.rs

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::common::{app_helper, app_helper::TestApp, auth_helper, auth_helper::TestUser, request};

async fn submit_as(app: &TestApp, owner: &TestUser) -> String {
    let req = request::create_authenticated_request(
        "POST",
        "/api/assessment/submit",
        &owner.access_token,
        Some(json!({
            "tier": "one-time-diagnostic",
            "organizationType": "community_college",
            "institutionName": "Lakeside Community College",
            "responses": { "leadership_1": 4, "communication_1": 2, "technology_1": 5 }
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    body["data"]["assessmentId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_json_report_for_owner() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;

    let req = request::create_authenticated_request(
        "POST",
        "/api/report/generate",
        &owner.access_token,
        Some(json!({ "assessmentId": assessment_id, "format": "json" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["assessmentId"], assessment_id.as_str());
    assert_eq!(body["data"]["tier"], "one-time-diagnostic");
    assert_eq!(body["data"]["institutionName"], "Lakeside Community College");
}

#[tokio::test]
async fn test_html_report_is_downloaded() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;

    let req = request::create_authenticated_request(
        "POST",
        "/api/report/generate",
        &owner.access_token,
        Some(json!({ "assessmentId": assessment_id })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        request::header_value(&res, header::CONTENT_TYPE),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        request::header_value(&res, header::CONTENT_DISPOSITION),
        format!("attachment; filename=\"northpath-report-{}.html\"", assessment_id)
    );
    let body = request::body_text(res).await;
    assert!(body.contains("Lakeside Community College"));
}

#[tokio::test]
async fn test_report_requires_assessment_access() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let stranger = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;

    let req = request::create_authenticated_request(
        "POST",
        "/api/report/generate",
        &stranger.access_token,
        Some(json!({ "assessmentId": assessment_id, "format": "json" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = request::create_authenticated_request(
        "POST",
        "/api/report/generate",
        &owner.access_token,
        Some(json!({ "assessmentId": assessment_id, "format": "pdf" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
