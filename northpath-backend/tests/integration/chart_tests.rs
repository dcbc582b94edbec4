// tests/integration/chart_tests.rs

use axum::http::{header, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::{app_helper, app_helper::TestApp, auth_helper, auth_helper::TestUser, request};

fn roles() -> Value {
    json!([
        { "id": "1", "roleTitle": "President", "fte": 1.0 },
        { "id": "2", "roleTitle": "Provost", "fte": 1.0, "parentId": "1" },
        { "id": "3", "roleTitle": "Registrar", "fte": 2.0, "parentId": "2" }
    ])
}

fn chain(len: usize) -> Value {
    Value::Array(
        (0..len)
            .map(|i| {
                let parent = i.checked_sub(1).map(|p| format!("r{}", p));
                json!({
                    "id": format!("r{}", i),
                    "roleTitle": format!("Level {}", i),
                    "fte": 1.0,
                    "parentId": parent
                })
            })
            .collect(),
    )
}

async fn submit_as(app: &TestApp, owner: &TestUser) -> String {
    let req = request::create_authenticated_request(
        "POST",
        "/api/assessment/submit",
        &owner.access_token,
        Some(json!({
            "tier": "one-time-diagnostic",
            "organizationType": "university",
            "responses": { "leadership_1": 4 }
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    body["data"]["assessmentId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_svg_chart_is_downloaded() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &user.access_token,
        Some(json!({ "roles": roles(), "format": "svg" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        request::header_value(&res, header::CONTENT_TYPE),
        "image/svg+xml"
    );
    assert_eq!(
        request::header_value(&res, header::CONTENT_DISPOSITION),
        "attachment; filename=\"organization-chart.svg\""
    );
    let body = request::body_text(res).await;
    assert!(body.starts_with("<svg"));
    assert!(body.contains(".org-node {"));
    assert!(body.contains("Registrar"));
}

#[tokio::test]
async fn test_csv_chart_is_downloaded() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &user.access_token,
        Some(json!({ "roles": roles(), "format": "csv", "name": "Main Campus" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(request::header_value(&res, header::CONTENT_TYPE), "text/csv");
    assert!(request::header_value(&res, header::CONTENT_DISPOSITION)
        .starts_with("attachment; filename=\"main-campus.csv\""));
    let body = request::body_text(res).await;
    assert!(body.starts_with("Role Title,FTE,Annual Cost,Level,Parent ID"));
    assert_eq!(body.lines().count(), 4);
}

#[tokio::test]
async fn test_too_deep_hierarchy_is_bad_request() {
    let app = app_helper::setup_app().await;
    let user = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &user.access_token,
        Some(json!({ "roles": chain(51) })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(res).await;
    assert_eq!(
        body["message"],
        "Organization hierarchy is 51 levels deep (maximum 50)"
    );

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &user.access_token,
        Some(json!({ "roles": chain(50) })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_saved_chart_follows_assessment_access() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let stranger = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;
    let save = json!({
        "roles": roles(),
        "saveToDatabase": true,
        "assessmentId": assessment_id
    });

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &owner.access_token,
        Some(save.clone()),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert!(body["data"]["chartId"].is_string());

    let chart_uri = format!("/api/chart/{}", assessment_id);
    let req = request::create_authenticated_request("GET", &chart_uri, &owner.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // 診断を参照できない利用者は読み書きできない
    let req =
        request::create_authenticated_request("GET", &chart_uri, &stranger.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = request::create_authenticated_request(
        "POST",
        "/api/chart/generate",
        &stranger.access_token,
        Some(save),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
