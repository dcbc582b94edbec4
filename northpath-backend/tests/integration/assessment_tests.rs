// tests/integration/assessment_tests.rs

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{app_helper, auth_helper, request};

fn submission() -> Value {
    json!({
        "tier": "one-time-diagnostic",
        "organizationType": "community_college",
        "institutionName": "Lakeside Community College",
        "contactEmail": "dean@lakeside.edu",
        "contactName": "Pat Dean",
        "responses": {
            "leadership_1": 4,
            "leadership_2": 3,
            "communication_1": 2,
            "technology_1": 5
        }
    })
}

#[tokio::test]
async fn test_anonymous_submission_is_accepted() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/assessment/submit",
            Some(submission()),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["assessmentId"].is_string());
    assert!(body["data"]["redirectUrl"]
        .as_str()
        .unwrap()
        .contains("one-time-diagnostic"));
}

#[tokio::test]
async fn test_submission_missing_fields_is_bad_request() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/assessment/submit",
            Some(json!({ "tier": "one-time-diagnostic" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Missing required fields"));
}

#[tokio::test]
async fn test_submission_with_invalid_email_fails_validation() {
    let app = app_helper::setup_app().await;
    let mut payload = submission();
    payload["contactEmail"] = json!("not-an-email");

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/assessment/submit",
            Some(payload),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert!(body["validation_errors"]["contact_email"].is_array());
}

#[tokio::test]
async fn test_owner_can_read_own_assessment() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/assessment/submit",
        &user.access_token,
        Some(submission()),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    let assessment_id = body["data"]["assessmentId"].as_str().unwrap().to_string();

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/assessments/{}", assessment_id),
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["id"], assessment_id);

    // 他人には見えない
    let stranger = auth_helper::create_user(&app.state);
    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/assessments/{}", assessment_id),
        &stranger.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_assessment_is_not_found() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/assessments/{}", Uuid::new_v4()),
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = request::body_json(res).await;
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn test_ai_readiness_submission_rejects_org_tier() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/ai-readiness/submit",
            Some(json!({
                "tier": "monthly-subscription",
                "responses": { "strategy_1": 3 }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unpaid_subscription_tier_is_forbidden() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);
    let mut payload = submission();
    payload["tier"] = json!("monthly-subscription");

    let req = request::create_authenticated_request(
        "POST",
        "/api/assessment/submit",
        &user.access_token,
        Some(payload),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
