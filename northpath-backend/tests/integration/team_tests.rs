// tests/integration/team_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use northpath_backend::domain::team_invitation_model::Model as TeamInvitation;
use northpath_backend::domain::team_member_model::TeamRole;
use northpath_backend::error::AppError;
use northpath_backend::repository::team_invitation_repository::TeamInvitationRepository;
use northpath_backend::repository::team_repository::TeamRepository;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{app_helper, app_helper::TestApp, auth_helper, auth_helper::TestUser, request};

async fn create_team(app: &TestApp, owner: &TestUser) -> String {
    let req = request::create_authenticated_request(
        "POST",
        "/api/teams",
        &owner.access_token,
        Some(json!({ "name": "Provost Office", "description": "Restructuring working group" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["role"], "admin");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn invite(app: &TestApp, inviter: &TestUser, team_id: &str, email: &str) -> String {
    let req = request::create_authenticated_request(
        "POST",
        &format!("/api/teams/{}/members", team_id),
        &inviter.access_token,
        Some(json!({ "email": email, "role": "member" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = request::body_json(res).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_invitation_flow() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let invitee = auth_helper::create_user_with_email(&app.state, "analyst@example.edu");
    let team_id = create_team(&app, &owner).await;
    let token = invite(&app, &owner, &team_id, "analyst@example.edu").await;

    // 未ログインでも招待内容は確認できる
    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "GET",
            &format!("/api/teams/invitations/verify?token={}", token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["teamName"], "Provost Office");

    // 受諾にはログインが必要
    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "POST",
            "/api/teams/invitations/verify",
            Some(json!({ "token": token })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = request::create_authenticated_request(
        "POST",
        "/api/teams/invitations/verify",
        &invitee.access_token,
        Some(json!({ "token": token })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = request::create_authenticated_request(
        "GET",
        &format!("/api/teams/{}/members", team_id),
        &owner.access_token,
        None,
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = request::body_json(res).await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 2);
    assert!(body["data"]["pendingInvitations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_token_is_bad_request() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "GET",
            "/api/teams/invitations/verify",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = app_helper::setup_app().await;

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "GET",
            "/api/teams/invitations/verify?token=does-not-exist",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_invitation_is_gone() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let team_id: Uuid = create_team(&app, &owner).await.parse().unwrap();

    let mut invitation = TeamInvitation::new(
        team_id,
        "late@example.edu".to_string(),
        "member".to_string(),
        "expired-token".to_string(),
        owner.id,
    );
    invitation.expires_at = Utc::now() - Duration::days(1);
    TeamInvitationRepository::new(app.db.connection.clone())
        .create_invitation(&invitation)
        .await
        .unwrap();

    let res = app
        .router
        .clone()
        .oneshot(request::create_request(
            "GET",
            "/api/teams/invitations/verify?token=expired-token",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GONE);
    let body = request::body_json(res).await;
    assert_eq!(body["message"], "Invitation has expired");

    let late = auth_helper::create_user_with_email(&app.state, "late@example.edu");
    let req = request::create_authenticated_request(
        "POST",
        "/api/teams/invitations/verify",
        &late.access_token,
        Some(json!({ "token": "expired-token" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_existing_member_cannot_join_twice() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let team_id = create_team(&app, &owner).await;
    let token = invite(&app, &owner, &team_id, &owner.email).await;

    let req = request::create_authenticated_request(
        "POST",
        "/api/teams/invitations/verify",
        &owner.access_token,
        Some(json!({ "token": token })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = request::body_json(res).await;
    assert_eq!(body["message"], "You are already a member of this team");
}

#[tokio::test]
async fn test_invitation_for_other_email_is_forbidden() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let team_id = create_team(&app, &owner).await;
    let token = invite(&app, &owner, &team_id, "intended@example.edu").await;

    let someone_else = auth_helper::create_user(&app.state);
    let req = request::create_authenticated_request(
        "POST",
        "/api/teams/invitations/verify",
        &someone_else.access_token,
        Some(json!({ "token": token })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_members_cannot_invite() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let team_id = create_team(&app, &owner).await;
    let stranger = auth_helper::create_user(&app.state);

    let req = request::create_authenticated_request(
        "POST",
        &format!("/api/teams/{}/members", team_id),
        &stranger.access_token,
        Some(json!({ "email": "x@example.edu" })),
    );
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accepted_token_cannot_be_replayed() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let invitee = auth_helper::create_user_with_email(&app.state, "registrar@example.edu");
    let team_id = create_team(&app, &owner).await;
    let token = invite(&app, &owner, &team_id, "registrar@example.edu").await;

    let accept = |access_token: &str| {
        request::create_authenticated_request(
            "POST",
            "/api/teams/invitations/verify",
            access_token,
            Some(json!({ "token": token })),
        )
    };
    let res = app.router.clone().oneshot(accept(&invitee.access_token)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.router.clone().oneshot(accept(&invitee.access_token)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let team_id: Uuid = team_id.parse().unwrap();
    let members = TeamRepository::new(app.db.connection.clone())
        .count_members(team_id)
        .await
        .unwrap();
    assert_eq!(members, 2);
}

#[tokio::test]
async fn test_stale_invitation_is_not_accepted_twice() {
    let app = app_helper::setup_app().await;
    let owner = auth_helper::create_user(&app.state);
    let invitee = auth_helper::create_user_with_email(&app.state, "bursar@example.edu");
    let team_id: Uuid = create_team(&app, &owner).await.parse().unwrap();

    let invitation = TeamInvitation::new(
        team_id,
        "bursar@example.edu".to_string(),
        "member".to_string(),
        "stale-token".to_string(),
        owner.id,
    );
    TeamInvitationRepository::new(app.db.connection.clone())
        .create_invitation(&invitation)
        .await
        .unwrap();

    // 同じ招待を読んだ2つのリクエストのうち一方だけが成立する
    let repo = TeamRepository::new(app.db.connection.clone());
    repo.accept_invitation(&invitation, invitee.id, TeamRole::Member)
        .await
        .unwrap();
    let second = repo
        .accept_invitation(&invitation, invitee.id, TeamRole::Member)
        .await;
    assert!(matches!(second, Err(AppError::NotFound(_))));

    assert_eq!(repo.count_members(team_id).await.unwrap(), 2);
}
