// tests/integration/collaboration_tests.rs

use axum::http::StatusCode;
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
            "organizationType": "university",
            "responses": { "leadership_1": 3 }
        })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    body["data"]["assessmentId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_collaborator_lifecycle() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let reviewer = auth_helper::create_user_with_email(&app.state, "reviewer@example.edu");
    let assessment_id = submit_as(&app, &owner).await;
    let collaborators_uri = format!("/api/assessments/{}/collaborators", assessment_id);

    let req = request::create_authenticated_request(
        "POST",
        &collaborators_uri,
        &owner.access_token,
        Some(json!({ "email": "Reviewer@Example.edu", "role": "viewer" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["email"], "reviewer@example.edu");

    // 招待された側も一覧と診断本体を閲覧できる
    let req =
        request::create_authenticated_request("GET", &collaborators_uri, &reviewer.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/assessments/{}", assessment_id),
        &reviewer.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // 削除にはメールが必要
    let req =
        request::create_authenticated_request("DELETE", &collaborators_uri, &owner.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = request::create_authenticated_request(
        "DELETE",
        &format!("{}?email=reviewer@example.edu", collaborators_uri),
        &owner.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = request::create_authenticated_request(
        "DELETE",
        &format!("{}?email=reviewer@example.edu", collaborators_uri),
        &owner.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_can_add_collaborators() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let stranger = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;

    let req = request::create_authenticated_request(
        "POST",
        &format!("/api/assessments/{}/collaborators", assessment_id),
        &stranger.access_token,
        Some(json!({ "email": "someone@example.edu" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_comments() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let assessment_id = submit_as(&app, &owner).await;
    let comments_uri = format!("/api/assessments/{}/comments", assessment_id);

    let req = request::create_authenticated_request(
        "POST",
        &comments_uri,
        &owner.access_token,
        Some(json!({ "content": "" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = request::create_authenticated_request(
        "POST",
        &comments_uri,
        &owner.access_token,
        Some(json!({ "content": "Span of control looks high", "section": "structure" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = request::create_authenticated_request("GET", &comments_uri, &owner.access_token, None);
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
