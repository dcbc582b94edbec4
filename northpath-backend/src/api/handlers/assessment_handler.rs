// northpath-backend/src/api/handlers/assessment_handler.rs

use crate::api::dto::assessment_dto::{SubmitAiReadinessRequest, SubmitAssessmentRequest};
use crate::api::AppState;
use crate::domain::assessment_model::Model as Assessment;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::assessment_service::{AiSubmissionReceipt, SubmissionReceipt, Submitter};
use crate::types::{ApiResponse, PaginatedResponse, PaginationQuery};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

fn submitter(user: Option<&AuthenticatedUser>) -> Option<Submitter> {
    user.map(|user| Submitter {
        user_id: user.user_id(),
        email: user.email().to_string(),
    })
}

/// 組織診断の提出 (未ログインでも可)
pub async fn submit_assessment_handler(
    State(app_state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Json(payload): Json<SubmitAssessmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SubmissionReceipt>>)> {
    payload.validate()?;
    let submission = payload.into_submission()?;

    info!(
        tier = %submission.tier,
        organization_type = %submission.organization_type,
        authenticated = user.is_some(),
        "Assessment submission received"
    );

    let receipt = app_state
        .assessment_service
        .submit(submission, submitter(user.as_ref()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Assessment submitted successfully",
            receipt,
        )),
    ))
}

/// AI準備度診断の提出
pub async fn submit_ai_readiness_handler(
    State(app_state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Json(payload): Json<SubmitAiReadinessRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AiSubmissionReceipt>>)> {
    payload.validate()?;
    let submission = payload.into_submission()?;

    let receipt = app_state
        .assessment_service
        .submit_ai_readiness(submission, submitter(user.as_ref()))
        .await?;

    info!(assessment_id = %receipt.id, tier = %receipt.tier, "AI readiness assessment stored");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "AI readiness assessment submitted successfully",
            receipt,
        )),
    ))
}

pub async fn list_assessments_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Assessment>>>> {
    let (page, per_page) = query.get_pagination();
    let (items, total) = app_state
        .assessment_service
        .list_for_user(user.user_id(), user.email(), page, per_page)
        .await?;

    Ok(Json(ApiResponse::success(
        "Assessments retrieved successfully",
        PaginatedResponse::new(items, page, per_page, total),
    )))
}

pub async fn get_assessment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Assessment>>> {
    let assessment = app_state
        .assessment_service
        .get_for_user(assessment_id, user.user_id(), user.email(), user.is_admin())
        .await?;

    Ok(Json(ApiResponse::success(
        "Assessment retrieved successfully",
        assessment,
    )))
}

/// 提出系のルーター (任意認証)
pub fn assessment_public_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/assessment/submit", post(submit_assessment_handler))
        .route("/api/ai-readiness/submit", post(submit_ai_readiness_handler))
        .with_state(app_state)
}

pub fn assessment_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/assessments", get(list_assessments_handler))
        .route("/api/assessments/{id}", get(get_assessment_handler))
        .with_state(app_state)
}
