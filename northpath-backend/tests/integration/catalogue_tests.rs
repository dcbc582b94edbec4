// tests/integration/catalogue_tests.rs

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::{app_helper, auth_helper, request};

#[tokio::test]
async fn test_feature_overview_for_tier() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        "/api/features?tier=comprehensive-package",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    let features = body["data"]["features"].as_array().unwrap();
    assert!(!features.is_empty());
    for key in body["data"]["enabledFeatures"].as_array().unwrap() {
        assert!(features
            .iter()
            .any(|f| f["key"] == *key && f["enabled"] == true));
    }

    let res = app
        .router
        .clone()
        .oneshot(request::create_request("GET", "/api/features", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_questions_for_tier_and_industry() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        "/api/questions?tier=one-time-diagnostic&industry=healthcare",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["tier"], "one-time-diagnostic");
    assert_eq!(body["data"]["industry"], "healthcare");
    assert_eq!(body["data"]["total"], 100);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 100);

    let req = request::create_authenticated_request(
        "GET",
        "/api/questions?tier=platinum",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscription_status_without_payment() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        "/api/subscription/status?tier=monthly-subscription",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["access"], "denied");
    assert_eq!(body["data"]["upgradeRequired"], true);
    assert_eq!(body["data"]["subscriptionStatus"]["isValid"], false);

    // 単発購入のティアは契約状態を持たない
    let req = request::create_authenticated_request(
        "GET",
        "/api/subscription/status?tier=one-time-diagnostic",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["access"], "granted");
    assert!(body["data"].get("subscriptionStatus").is_none());
}

#[tokio::test]
async fn test_checkout_session_in_development_mode() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/payments/create-session",
        &user.access_token,
        Some(json!({ "tier": "one-time-diagnostic" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    let session_id = body["data"]["sessionId"].as_str().unwrap();
    assert!(session_id.starts_with("cs_test_mock_"));
    assert_eq!(
        body["data"]["url"],
        format!(
            "http://localhost:3000/mock-checkout?session_id={}&tier=one-time-diagnostic",
            session_id
        )
    );
    assert_eq!(body["data"]["mode"], "payment");

    let req = request::create_authenticated_request(
        "POST",
        "/api/payments/create-session",
        &user.access_token,
        Some(json!({ "tier": "monthly-subscription" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["mode"], "subscription");

    let req = request::create_authenticated_request(
        "POST",
        "/api/payments/create-session",
        &user.access_token,
        Some(json!({ "tier": "gold-plan" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
