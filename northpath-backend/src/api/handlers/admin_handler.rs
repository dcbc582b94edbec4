// northpath-backend/src/api/handlers/admin_handler.rs

use crate::api::dto::analytics_dto::{AdminAnalyticsQuery, ExpiringQuery};
use crate::api::AppState;
use crate::domain::assessment_model::Model as Assessment;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::analytics_service::AdminAnalytics;
use crate::service::assessment_service::AssessmentDetail;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// 診断全体の集計 (`?range=` は日数)
pub async fn admin_analytics_handler(
    State(app_state): State<AppState>,
    admin_user: AuthenticatedUser,
    Query(query): Query<AdminAnalyticsQuery>,
) -> AppResult<Json<ApiResponse<AdminAnalytics>>> {
    admin_user.ensure_admin()?;

    info!(
        admin_id = %admin_user.user_id(),
        range = ?query.range,
        "Admin requesting assessment analytics"
    );

    let analytics = app_state
        .analytics_service
        .admin_overview(query.range)
        .await?;

    Ok(Json(ApiResponse::success(
        "Analytics retrieved successfully",
        analytics,
    )))
}

/// 共同編集者とコメントを含む診断詳細
pub async fn admin_assessment_detail_handler(
    State(app_state): State<AppState>,
    admin_user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AssessmentDetail>>> {
    admin_user.ensure_admin()?;

    let detail = app_state
        .assessment_service
        .admin_detail(assessment_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Assessment retrieved successfully",
        detail,
    )))
}

pub async fn expiring_subscriptions_handler(
    State(app_state): State<AppState>,
    admin_user: AuthenticatedUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<ApiResponse<Vec<Assessment>>>> {
    admin_user.ensure_admin()?;
    let days = query.days();

    let expiring = app_state.subscription_service.expiring(days).await?;
    let count = expiring.len();

    Ok(Json(
        ApiResponse::success("Expiring subscriptions retrieved successfully", expiring)
            .with_metadata(json!({ "days": days, "count": count })),
    ))
}

pub fn admin_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/admin/analytics", get(admin_analytics_handler))
        .route(
            "/api/admin/assessments/{id}",
            get(admin_assessment_detail_handler),
        )
        .route(
            "/api/admin/subscriptions/expiring",
            get(expiring_subscriptions_handler),
        )
        .with_state(app_state)
}
