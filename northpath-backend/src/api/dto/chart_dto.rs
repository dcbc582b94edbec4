// northpath-backend/src/api/dto/chart_dto.rs

use crate::engine::org_chart::RoleInput;
use crate::error::{AppError, AppResult};
use crate::service::chart_service::{ChartFormat, ChartRequest};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// 組織図の生成リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateChartRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Roles must contain between 1 and 5000 entries"
    ))]
    pub roles: Vec<RoleInput>,

    #[serde(default)]
    pub custom_rates: HashMap<String, f64>,

    /// json | svg | csv
    pub format: Option<String>,

    #[serde(default)]
    pub save_to_database: bool,

    pub assessment_id: Option<Uuid>,

    #[validate(length(max = 200, message = "Chart name cannot exceed 200 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 200, max = 4000, message = "Width must be between 200 and 4000"))]
    pub width: Option<u32>,
}

impl GenerateChartRequest {
    pub fn into_chart_request(self) -> AppResult<ChartRequest> {
        let format = match self.format.as_deref() {
            None => ChartFormat::default(),
            Some(raw) => raw.parse::<ChartFormat>().map_err(AppError::BadRequest)?,
        };
        Ok(ChartRequest {
            assessment_id: self.assessment_id,
            name: self.name,
            roles: self.roles,
            custom_rates: self.custom_rates,
            format,
            save_to_database: self.save_to_database,
            width: self.width,
        })
    }
}
