// northpath-backend/src/api/handlers/team_handler.rs

use crate::api::dto::team_dto::{
    AcceptInvitationRequest, CreateTeamRequest, InvitationTokenQuery, InviteMemberRequest,
};
use crate::api::AppState;
use crate::domain::team_invitation_model::Model as TeamInvitation;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::service::team_service::{InvitationPreview, JoinResult, TeamRoster, TeamSummary};
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// チーム作成 (作成者が admin メンバーになる)
pub async fn create_team_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TeamSummary>>)> {
    payload.validate()?;

    let team = app_state
        .team_service
        .create_team(&user.actor(), &payload.name, payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Team created successfully", team)),
    ))
}

pub async fn list_teams_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<TeamSummary>>>> {
    let teams = app_state.team_service.list_teams(&user.actor()).await?;

    Ok(Json(ApiResponse::success(
        "Teams retrieved successfully",
        teams,
    )))
}

pub async fn list_members_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(team_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TeamRoster>>> {
    let roster = app_state.team_service.roster(team_id, &user.actor()).await?;

    Ok(Json(ApiResponse::success(
        "Team members retrieved successfully",
        roster,
    )))
}

pub async fn invite_member_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TeamInvitation>>)> {
    payload.validate()?;
    let role = payload.role()?;

    let invitation = app_state
        .team_service
        .invite_member(team_id, &user.actor(), &payload.email, role)
        .await?;

    info!(team_id = %team_id, invitation_id = %invitation.id, "Team invitation created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Invitation sent successfully",
            invitation,
        )),
    ))
}

/// 招待内容の確認 (ログイン不要)
pub async fn preview_invitation_handler(
    State(app_state): State<AppState>,
    Query(query): Query<InvitationTokenQuery>,
) -> AppResult<Json<ApiResponse<InvitationPreview>>> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::BadRequest("Token required".to_string()))?;

    let preview = app_state.team_service.preview_invitation(&token).await?;

    Ok(Json(ApiResponse::success("Invitation is valid", preview)))
}

/// 招待の受諾。メールアドレスが一致するログインユーザーのみ
pub async fn accept_invitation_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<AcceptInvitationRequest>,
) -> AppResult<Json<ApiResponse<JoinResult>>> {
    payload.validate()?;

    let joined = app_state
        .team_service
        .accept_invitation(&payload.token, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Successfully joined the team",
        joined,
    )))
}

/// 招待の確認と受諾は同じパス。受諾側はハンドラで認証を要求する
pub fn team_public_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/teams/invitations/verify",
            get(preview_invitation_handler).post(accept_invitation_handler),
        )
        .with_state(app_state)
}

pub fn team_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/teams", get(list_teams_handler).post(create_team_handler))
        .route(
            "/api/teams/{id}/members",
            get(list_members_handler).post(invite_member_handler),
        )
        .with_state(app_state)
}
