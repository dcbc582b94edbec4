// northpath-backend/src/api/dto/report_dto.rs

use crate::engine::cost::CostPosition;
use crate::error::{AppError, AppResult};
use crate::service::report_service::{ReportFormat, ReportRequest};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub assessment_id: Uuid,

    /// html | json
    pub format: Option<String>,

    #[validate(length(max = 200, message = "Title cannot exceed 200 characters"))]
    pub title: Option<String>,

    /// 指定があればコスト削減の試算を載せる
    #[serde(default)]
    pub positions: Vec<CostPosition>,

    #[validate(range(min = 0.0, max = 1.0, message = "Redundancy must be between 0 and 1"))]
    pub redundancy_pct: Option<f64>,
}

impl GenerateReportRequest {
    pub fn into_report_request(self) -> AppResult<ReportRequest> {
        let format = match self.format.as_deref() {
            None => ReportFormat::default(),
            Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
        };
        Ok(ReportRequest {
            assessment_id: self.assessment_id,
            format,
            title: self.title,
            cost_positions: self.positions,
            redundancy_pct: self.redundancy_pct,
        })
    }
}
