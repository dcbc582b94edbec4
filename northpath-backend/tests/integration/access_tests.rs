// tests/integration/access_tests.rs

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::{app_helper, auth_helper, request};

#[tokio::test]
async fn test_health_check() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app_helper::setup_app().await;

    for (method, uri) in [
        ("GET", "/api/assessments"),
        ("GET", "/api/scenarios"),
        ("GET", "/api/teams"),
        ("GET", "/api/admin/analytics"),
        ("GET", "/api/payments/history"),
    ] {
        let res = app
            .router
            .clone()
            .oneshot(request::create_request(method, uri, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = app_helper::setup_app().await;

    let req = request::create_authenticated_request("GET", "/api/assessments", "not-a-jwt", None);
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbid_regular_users() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    for uri in [
        "/api/admin/analytics",
        "/api/admin/subscriptions/expiring",
    ] {
        let req = request::create_authenticated_request("GET", uri, &user.access_token, None);
        let res = app.router.clone().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
        let body = request::body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "forbidden");
    }
}

#[tokio::test]
async fn test_admin_analytics_for_admin() {
    let app = app_helper::setup_app().await;
    let admin = auth_helper::create_admin(&app.state);

    let req =
        request::create_authenticated_request("GET", "/api/admin/analytics", &admin.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_public_tier_catalogue() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request("GET", "/api/tiers", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["metadata"]["count"], 8);

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "GET",
            "/api/tiers/one-time-diagnostic",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .router
        .clone()
        .oneshot(request::create_request("GET", "/api/tiers/platinum", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_one_time_tier_access_is_always_allowed() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "GET",
        "/api/subscription/status?tier=one-time-diagnostic",
        &user.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_without_signature_is_rejected() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/payments/webhook",
            Some(json!({ "type": "checkout.session.completed" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert_eq!(body["message"], "No signature provided");
}
