// northpath-backend/src/api/dto/scenario_dto.rs

use crate::domain::scenario_model::ScenarioStatus;
use crate::engine::roi::{CalculationType, RoiAssumptions};
use crate::error::{AppError, AppResult};
use crate::service::scenario_service::{RoiRequest, ScenarioFilter};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

const DEFAULT_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioListQuery {
    pub organization_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
}

impl ScenarioListQuery {
    pub fn into_filter(self) -> AppResult<ScenarioFilter> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ScenarioStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        Ok(ScenarioFilter {
            organization_id: self.organization_id,
            status,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScenarioRequest {
    #[validate(length(min = 1, max = 100, message = "Organization ID is required"))]
    pub organization_id: String,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: String,

    pub baseline_data: Value,
    pub variant_data: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareScenarioRequest {
    /// 保存済みの案の代わりに比較する案
    pub variant: Option<Value>,
}

/// ROI 計算。`timeHorizon` は月数で受け取る
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoiCalculationRequest {
    pub calculation_type: Option<String>,

    #[serde(default)]
    pub assumptions: Option<RoiAssumptions>,

    #[validate(range(min = 0.0, max = 1.0, message = "Discount rate must be between 0 and 1"))]
    pub discount_rate: Option<f64>,

    #[validate(range(min = 1, max = 600, message = "Time horizon must be between 1 and 600 months"))]
    pub time_horizon: Option<u32>,

    #[validate(range(min = 1, message = "Iterations must be positive"))]
    pub iterations: Option<usize>,
}

impl RoiCalculationRequest {
    pub fn into_roi_request(self) -> AppResult<RoiRequest> {
        let calculation_type = match self.calculation_type.as_deref() {
            None => CalculationType::Simple,
            Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
        };

        let mut assumptions = self.assumptions.unwrap_or_default();
        if let Some(rate) = self.discount_rate {
            assumptions.discount_rate = rate;
        }
        // 月数は端数を切り上げて年数にする
        if let Some(months) = self.time_horizon {
            assumptions.time_horizon = months.div_ceil(12).max(1);
        }

        Ok(RoiRequest {
            calculation_type,
            assumptions,
            iterations: Some(self.iterations.unwrap_or(DEFAULT_ITERATIONS)),
        })
    }
}
