// northpath-backend/src/api/handlers/analysis_handler.rs

use crate::api::dto::analysis_dto::{
    AiReadinessResponse, BenchmarkRequest, CostSavingsRequest, CostSavingsResponse,
    FormattedSavings, ResponsesRequest, ScoreRequest,
};
use crate::api::AppState;
use crate::engine::ai_readiness::{calculate_aics, calculate_airix, calculate_airs};
use crate::engine::cost::{
    cost_savings_recommendations, department_savings, detailed_cost_analysis, format_percentage,
    risk_adjusted_savings, roi_timeline,
};
use crate::engine::dsch::{self, DschMetrics};
use crate::engine::response::OrganizationProfile;
use crate::engine::scoring::{score_sections, score_v21, ScoreOutput, SectionScoreResult};
use crate::engine::stats::{
    benchmark_comparison, validate_assessment_data, BenchmarkComparison, DataValidation,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::service::analysis_service::{organization_profile, parse_responses};
use crate::types::ApiResponse;
use axum::{
    extract::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

/// v2.1 とセクション集計のどちらか
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScoreResult {
    V21(Box<ScoreOutput>),
    Sections(SectionScoreResult),
}

fn profile_for(request: &ResponsesRequest) -> OrganizationProfile {
    request.organization_profile.clone().unwrap_or_else(|| {
        organization_profile(request.organization_type.as_deref().unwrap_or_default())
    })
}

pub async fn score_handler(
    user: AuthenticatedUser,
    Json(payload): Json<ScoreRequest>,
) -> AppResult<Json<ApiResponse<ScoreResult>>> {
    let segment = payload.segment();

    let result = match (&payload.answers, &payload.responses) {
        (Some(answers), _) => ScoreResult::V21(Box::new(score_v21(answers, segment))),
        (None, Some(responses)) => ScoreResult::Sections(score_sections(responses)),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either answers or responses are required".to_string(),
            ))
        }
    };

    info!(user_id = %user.user_id(), segment = ?segment, "Score calculated");

    Ok(Json(ApiResponse::success(
        "Score calculated successfully",
        result,
    )))
}

pub async fn dsch_handler(
    _user: AuthenticatedUser,
    Json(payload): Json<ResponsesRequest>,
) -> AppResult<Json<ApiResponse<DschMetrics>>> {
    let responses = parse_responses(&payload.responses);
    let metrics = dsch::calculate(&responses, &profile_for(&payload));

    Ok(Json(
        ApiResponse::success("DSCH analysis completed", metrics)
            .with_metadata(json!({ "responseCount": responses.len() })),
    ))
}

/// AIRIX / AIRS / AICS を要求されたものだけ実行
pub async fn ai_readiness_handler(
    _user: AuthenticatedUser,
    Json(payload): Json<ResponsesRequest>,
) -> AppResult<Json<ApiResponse<AiReadinessResponse>>> {
    let responses = parse_responses(&payload.responses);
    let profile = profile_for(&payload);

    let result = AiReadinessResponse {
        airix: payload
            .wants("AIRIX")
            .then(|| json!(calculate_airix(&responses, &profile))),
        airs: payload
            .wants("AIRS")
            .then(|| json!(calculate_airs(&responses, &profile))),
        aics: payload
            .wants("AICS")
            .then(|| json!(calculate_aics(&responses, &profile))),
    };

    Ok(Json(ApiResponse::success(
        "AI readiness analysis completed",
        result,
    )))
}

pub async fn cost_savings_handler(
    _user: AuthenticatedUser,
    Json(payload): Json<CostSavingsRequest>,
) -> AppResult<Json<ApiResponse<CostSavingsResponse>>> {
    payload.validate()?;

    let analysis = detailed_cost_analysis(&payload.positions, payload.redundancy_pct);
    let recommendations = cost_savings_recommendations(&analysis);

    let response = CostSavingsResponse {
        formatted: FormattedSavings::from(&analysis.savings),
        redundancy: format_percentage(payload.redundancy_pct * 100.0, 1),
        roi_timeline: payload
            .implementation_cost
            .map(|cost| roi_timeline(&analysis.savings, cost)),
        risk_adjusted: payload
            .confidence
            .map(|confidence| risk_adjusted_savings(&analysis.savings, confidence)),
        departments: payload
            .redundancy_by_department
            .as_ref()
            .map(|by_department| department_savings(&payload.positions, by_department)),
        recommendations,
        analysis,
    };

    Ok(Json(ApiResponse::success(
        "Cost savings calculated successfully",
        response,
    )))
}

/// 入力データの検証 (本文は任意の JSON)
pub async fn validate_data_handler(
    _user: AuthenticatedUser,
    Json(payload): Json<Value>,
) -> AppResult<Json<ApiResponse<DataValidation>>> {
    let data = (!payload.is_null()).then_some(&payload);
    let validation = validate_assessment_data(data);

    Ok(Json(ApiResponse::success(
        "Data validation completed",
        validation,
    )))
}

pub async fn benchmark_handler(
    _user: AuthenticatedUser,
    Json(payload): Json<BenchmarkRequest>,
) -> AppResult<Json<ApiResponse<BenchmarkComparison>>> {
    payload.validate()?;
    let comparison = benchmark_comparison(&payload.scores, &payload.benchmarks);

    Ok(Json(ApiResponse::success(
        "Benchmark comparison completed",
        comparison,
    )))
}

pub fn analysis_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analysis/score", post(score_handler))
        .route("/api/analysis/dsch", post(dsch_handler))
        .route("/api/analysis/ai-readiness", post(ai_readiness_handler))
        .route("/api/analysis/cost-savings", post(cost_savings_handler))
        .route("/api/analysis/validate", post(validate_data_handler))
        .route("/api/analysis/benchmark", post(benchmark_handler))
        .with_state(app_state)
}
