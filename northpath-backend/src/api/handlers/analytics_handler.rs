// northpath-backend/src/api/handlers/analytics_handler.rs

use crate::api::dto::analytics_dto::TeamCollaborationQuery;
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::analytics_service::TeamCollaboration;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Query, State},
    routing::get,
    Router,
};

pub async fn team_collaboration_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<TeamCollaborationQuery>,
) -> AppResult<Json<ApiResponse<TeamCollaboration>>> {
    let range = query.range()?;
    let analytics = app_state
        .analytics_service
        .team_collaboration(query.team_id, range, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Team collaboration analytics retrieved successfully",
        analytics,
    )))
}

pub fn analytics_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/analytics/team-collaboration",
            get(team_collaboration_handler),
        )
        .with_state(app_state)
}
