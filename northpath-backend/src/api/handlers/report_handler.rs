// northpath-backend/src/api/handlers/report_handler.rs

use crate::api::dto::report_dto::GenerateReportRequest;
use crate::api::handlers::chart_handler::attachment;
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::report_service::ReportOutput;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tracing::info;
use validator::Validate;

/// 診断レポートの生成。html はダウンロード、json はエンベロープで返す
pub async fn generate_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<GenerateReportRequest>,
) -> AppResult<Response> {
    payload.validate()?;
    let request = payload.into_report_request()?;
    let assessment_id = request.assessment_id;

    let output = app_state
        .report_service
        .generate(request, &user.actor())
        .await?;

    info!(
        user_id = %user.user_id(),
        assessment_id = %assessment_id,
        "Report generated"
    );

    Ok(match output {
        ReportOutput::Html { filename, body } => {
            attachment("text/html; charset=utf-8", &filename, body)
        }
        ReportOutput::Json(document) => {
            Json(ApiResponse::success("Report generated successfully", *document))
                .into_response()
        }
    })
}

pub fn report_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/report/generate", post(generate_report_handler))
        .with_state(app_state)
}
