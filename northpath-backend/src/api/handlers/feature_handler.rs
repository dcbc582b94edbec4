// northpath-backend/src/api/handlers/feature_handler.rs

use crate::api::dto::tier_dto::TierQuery;
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::feature_flag_service::{FeatureOverview, FeatureStatus};
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};

/// 利用者ごとの機能フラグ一覧
pub async fn list_features_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<TierQuery>,
) -> AppResult<Json<ApiResponse<FeatureOverview>>> {
    let ctx = user.feature_context(query.tier.as_deref());
    let overview = app_state.feature_flag_service.overview(&ctx);

    Ok(Json(ApiResponse::success(
        "Feature flags retrieved successfully",
        overview,
    )))
}

pub async fn get_feature_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
    Query(query): Query<TierQuery>,
) -> AppResult<Json<ApiResponse<FeatureStatus>>> {
    let ctx = user.feature_context(query.tier.as_deref());
    let status = app_state.feature_flag_service.status(&name, &ctx)?;

    Ok(Json(ApiResponse::success(
        "Feature flag retrieved successfully",
        status,
    )))
}

pub fn feature_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/features", get(list_features_handler))
        .route("/api/features/{name}", get(get_feature_handler))
        .with_state(app_state)
}
