// northpath-backend/src/api/handlers/scenario_handler.rs

use crate::api::dto::scenario_dto::{
    CompareScenarioRequest, CreateScenarioRequest, RoiCalculationRequest, ScenarioListQuery,
};
use crate::api::dto::tier_dto::TierQuery;
use crate::api::AppState;
use crate::domain::scenario_model::Model as Scenario;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::scenario_service::{RoiHistory, RoiResult, ScenarioComparisonReport};
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub async fn list_scenarios_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ScenarioListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Scenario>>>> {
    let filter = query.into_filter()?;
    let scenarios = app_state
        .scenario_service
        .list(&user.actor(), filter)
        .await?;

    Ok(Json(ApiResponse::success(
        "Scenarios retrieved successfully",
        scenarios,
    )))
}

pub async fn create_scenario_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateScenarioRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Scenario>>)> {
    payload.validate()?;

    let scenario = app_state
        .scenario_service
        .create(
            &user.actor(),
            &payload.organization_id,
            &payload.title,
            &payload.description,
            payload.baseline_data,
            payload.variant_data,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Scenario created successfully", scenario)),
    ))
}

pub async fn get_scenario_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(scenario_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Scenario>>> {
    let scenario = app_state
        .scenario_service
        .get(scenario_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Scenario retrieved successfully",
        scenario,
    )))
}

pub async fn delete_scenario_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(scenario_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    app_state
        .scenario_service
        .delete(scenario_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::message("Scenario deleted successfully")))
}

/// 本文の `variant` があれば保存済みの案の代わりに比較する
pub async fn compare_scenario_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(scenario_id): Path<Uuid>,
    payload: Option<Json<CompareScenarioRequest>>,
) -> AppResult<Json<ApiResponse<ScenarioComparisonReport>>> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();

    let report = app_state
        .scenario_service
        .compare(scenario_id, &user.actor(), payload.variant)
        .await?;

    Ok(Json(ApiResponse::success(
        "Scenario comparison completed",
        report,
    )))
}

pub async fn roi_history_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(scenario_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoiHistory>>> {
    let history = app_state
        .scenario_service
        .roi_history(scenario_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "ROI calculations retrieved successfully",
        history,
    )))
}

/// ROI 計算。機能フラグの評価には `?tier=` を使う
pub async fn calculate_roi_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(scenario_id): Path<Uuid>,
    Query(tier): Query<TierQuery>,
    Json(payload): Json<RoiCalculationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RoiResult>>)> {
    payload.validate()?;
    let request = payload.into_roi_request()?;
    let ctx = user.feature_context(tier.tier.as_deref());

    info!(
        scenario_id = %scenario_id,
        calculation_type = ?request.calculation_type,
        "Calculating scenario ROI"
    );

    let result = app_state
        .scenario_service
        .calculate_roi(scenario_id, &user.actor(), request, &ctx)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("ROI calculated successfully", result)),
    ))
}

pub fn scenario_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/api/scenarios/{id}",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .route("/api/scenarios/{id}/compare", post(compare_scenario_handler))
        .route(
            "/api/scenarios/{id}/roi",
            get(roi_history_handler).post(calculate_roi_handler),
        )
        .with_state(app_state)
}
