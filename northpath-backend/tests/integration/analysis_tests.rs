// tests/integration/analysis_tests.rs

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::{app_helper, auth_helper, request};

#[tokio::test]
async fn test_score_requires_answers_or_responses() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/analysis/score",
        &user.access_token,
        Some(json!({ "organizationType": "university" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert_eq!(body["message"], "Either answers or responses are required");
}

#[tokio::test]
async fn test_score_v21_answers() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/analysis/score",
        &user.access_token,
        Some(json!({
            "answers": { "span_of_control": 3.0, "communication_flow": 2.0, "decision_rights": 4.0 },
            "organizationType": "university"
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    let score = body["data"]["score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert!(body["data"]["tier"].is_string());
}

#[tokio::test]
async fn test_cost_savings() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/analysis/cost-savings",
        &user.access_token,
        Some(json!({
            "positions": [
                { "id": "p1", "title": "Registrar", "department": "Academic", "totalCost": 90000.0 },
                { "id": "p2", "title": "Analyst", "department": "IT", "totalCost": 70000.0 }
            ],
            "redundancyPct": 0.2,
            "implementationCost": 10000.0
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["redundancy"], "20.0%");
    assert!(body["data"]["roiTimeline"].is_object());
}

#[tokio::test]
async fn test_cost_savings_validation() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/analysis/cost-savings",
        &user.access_token,
        Some(json!({ "positions": [], "redundancyPct": 1.5 })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert!(body["validation_errors"]["positions"].is_array());
    assert!(body["validation_errors"]["redundancy_pct"].is_array());
}

#[tokio::test]
async fn test_ai_readiness_selected_algorithms() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/analysis/ai-readiness",
        &user.access_token,
        Some(json!({
            "responses": { "strategy_1": 4, "data_1": 3, "culture_1": 2 },
            "algorithms": ["airix"]
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert!(body["data"]["airix"].is_object());
    assert!(body["data"].get("airs").is_none());
    assert!(body["data"].get("aics").is_none());
}
