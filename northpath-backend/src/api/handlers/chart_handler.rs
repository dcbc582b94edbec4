// northpath-backend/src/api/handlers/chart_handler.rs

use crate::api::dto::chart_dto::GenerateChartRequest;
use crate::api::AppState;
use crate::domain::org_chart_model::Model as OrgChart;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::chart_service::ChartOutput;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 添付ファイルとして返す
pub(crate) fn attachment(content_type: &str, filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// 組織図の生成。json はエンベロープ、svg/csv はファイルで返す
pub async fn generate_chart_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<GenerateChartRequest>,
) -> AppResult<Response> {
    payload.validate()?;
    let request = payload.into_chart_request()?;

    info!(
        user_id = %user.user_id(),
        roles = request.roles.len(),
        format = ?request.format,
        save = request.save_to_database,
        "Generating org chart"
    );

    let response = match app_state
        .chart_service
        .generate(request, &user.actor())
        .await?
    {
        ChartOutput::Document(document) => Json(ApiResponse::success(
            "Org chart generated successfully",
            *document,
        ))
        .into_response(),
        ChartOutput::File {
            format,
            filename,
            body,
        } => attachment(format.content_type(), &filename, body),
    };

    Ok(response)
}

pub async fn get_chart_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrgChart>>> {
    let chart = app_state
        .chart_service
        .latest_for_assessment(assessment_id, &user.actor())
        .await?;

    Ok(Json(ApiResponse::success(
        "Org chart retrieved successfully",
        chart,
    )))
}

pub fn chart_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/chart/generate", post(generate_chart_handler))
        .route("/api/chart/{assessment_id}", get(get_chart_handler))
        .with_state(app_state)
}
