// northpath-backend/src/api/handlers/tier_handler.rs

use crate::api::dto::tier_dto::{
    parse_tier, QuestionSet, QuestionsQuery, TierAccessResponse, TierDetail, TierSummary,
    ValidateAccessRequest,
};
use crate::api::AppState;
use crate::domain::pricing_tier::{validate_usage, PricingTier};
use crate::engine::question_filter::{questions_for_tier, QUESTION_BANK};
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::info;

/// ティア一覧
pub async fn list_tiers_handler() -> AppResult<Json<ApiResponse<Vec<TierSummary>>>> {
    let tiers: Vec<TierSummary> = PricingTier::all().into_iter().map(TierSummary::from).collect();
    let count = tiers.len();

    Ok(Json(
        ApiResponse::success("Pricing tiers retrieved successfully", tiers)
            .with_metadata(json!({ "count": count })),
    ))
}

pub async fn get_tier_handler(
    Path(tier): Path<String>,
) -> AppResult<Json<ApiResponse<TierDetail>>> {
    let tier = parse_tier(&tier)?;
    Ok(Json(ApiResponse::success(
        "Pricing tier retrieved successfully",
        TierDetail::from(tier),
    )))
}

/// 契約状態・利用上限・AIティア階層をまとめて確認する
pub async fn validate_access_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(tier): Path<String>,
    payload: Option<Json<ValidateAccessRequest>>,
) -> AppResult<Json<ApiResponse<TierAccessResponse>>> {
    let tier = parse_tier(&tier)?;
    let payload = payload.map(|Json(body)| body).unwrap_or_default();

    let has_required_tier_access = payload
        .required_tier
        .as_deref()
        .map(parse_tier)
        .transpose()?
        .map(|required| tier.has_ai_tier_access(required));

    let access = app_state
        .subscription_service
        .check_access(user.user_id(), tier)
        .await?;
    let usage = validate_usage(tier, &payload.usage);

    info!(
        user_id = %user.user_id(),
        tier = %tier,
        allowed = access.is_allowed(),
        within_limits = usage.valid,
        "Tier access validated"
    );

    Ok(Json(ApiResponse::success(
        "Tier access validated",
        TierAccessResponse {
            tier,
            access,
            usage,
            has_required_tier_access,
        },
    )))
}

/// ティアと業種に応じた設問
pub async fn questions_handler(
    _user: AuthenticatedUser,
    Query(query): Query<QuestionsQuery>,
) -> AppResult<Json<ApiResponse<QuestionSet>>> {
    let tier = parse_tier(&query.tier)?;
    let questions = questions_for_tier(&QUESTION_BANK, tier, query.industry.as_deref());

    Ok(Json(ApiResponse::success(
        "Questions retrieved successfully",
        QuestionSet::new(tier, query.industry, &QUESTION_BANK.likert_scale, questions),
    )))
}

pub fn tier_public_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/tiers", get(list_tiers_handler))
        .route("/api/tiers/{tier}", get(get_tier_handler))
        .with_state(app_state)
}

pub fn tier_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/tiers/{tier}/validate-access", post(validate_access_handler))
        .route("/api/questions", get(questions_handler))
        .with_state(app_state)
}
