// northpath-backend/src/api/handlers/subscription_handler.rs

use crate::api::dto::tier_dto::{parse_tier, SubscriptionStatusQuery};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::subscription_service::AccessCheck;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Query, State},
    routing::get,
    Router,
};

/// 継続課金ティアの契約状態と利用可否
pub async fn subscription_status_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SubscriptionStatusQuery>,
) -> AppResult<Json<ApiResponse<AccessCheck>>> {
    let tier = parse_tier(&query.tier)?;
    let access = app_state
        .subscription_service
        .check_access(user.user_id(), tier)
        .await?;

    Ok(Json(ApiResponse::success(
        "Subscription status retrieved successfully",
        access,
    )))
}

pub fn subscription_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/subscription/status", get(subscription_status_handler))
        .with_state(app_state)
}
