// northpath-backend/src/api/handlers/collaboration_handler.rs

use crate::api::dto::assessment_dto::{
    AddCollaboratorRequest, CreateCommentRequest, RemoveCollaboratorQuery,
};
use crate::api::AppState;
use crate::domain::assessment_collaborator_model::Model as Collaborator;
use crate::domain::assessment_comment_model::Model as Comment;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use uuid::Uuid;
use validator::Validate;

pub async fn list_collaborators_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Collaborator>>>> {
    let collaborators = app_state
        .collaboration_service
        .list_collaborators(assessment_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Collaborators retrieved successfully",
        collaborators,
    )))
}

/// 共同編集者の追加 (同じメールなら役割を更新)
pub async fn add_collaborator_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<AddCollaboratorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Collaborator>>)> {
    payload.validate()?;
    let role = payload.role()?;

    let collaborator = app_state
        .collaboration_service
        .add_collaborator(assessment_id, &user.actor(), &payload.email, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Collaborator added successfully",
            collaborator,
        )),
    ))
}

pub async fn remove_collaborator_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
    Query(query): Query<RemoveCollaboratorQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    let email = query
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    app_state
        .collaboration_service
        .remove_collaborator(assessment_id, &user.actor(), &email)
        .await?;

    Ok(Json(ApiResponse::message("Collaborator removed successfully")))
}

pub async fn list_comments_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Comment>>>> {
    let comments = app_state
        .collaboration_service
        .list_comments(assessment_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Comments retrieved successfully",
        comments,
    )))
}

pub async fn add_comment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    payload.validate()?;

    let comment = app_state
        .collaboration_service
        .add_comment(assessment_id, &user.actor(), &payload.content, payload.section)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Comment added successfully", comment)),
    ))
}

pub fn collaboration_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/assessments/{id}/collaborators",
            get(list_collaborators_handler)
                .post(add_collaborator_handler)
                .delete(remove_collaborator_handler),
        )
        .route(
            "/api/assessments/{id}/comments",
            get(list_comments_handler).post(add_comment_handler),
        )
        .with_state(app_state)
}
