// northpath-backend/src/service/scenario_service.rs

use crate::db::DbPool;
use crate::domain::feature_flag::FeatureContext;
use crate::domain::roi_calculation_model::Model as RoiCalculation;
use crate::domain::scenario_model::{Model as Scenario, ScenarioStatus};
use crate::engine::roi::{
    calculate_roi, CalculationType, RoiAnalysis, RoiAssumptions, DEFAULT_MONTE_CARLO_ITERATIONS,
    MAX_MONTE_CARLO_ITERATIONS,
};
use crate::engine::scenario::{
    compare_scenarios, positions_from_chart, run_scenario_engine, OrganizationalBaseline,
    OrganizationalVariant, ScenarioEngineResult,
};
use crate::error::{AppError, AppResult};
use crate::repository::scenario_repository::{NewRoiCalculation, NewScenario, ScenarioRepository};
use crate::service::collaboration_service::Actor;
use crate::service::feature_flag_service::FeatureFlagService;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_SCENARIO_LIMIT: u64 = 50;
pub const MAX_SCENARIO_LIMIT: u64 = 100;
pub const MONTE_CARLO_FLAG: &str = "MONTE_CARLO_SIMULATION";

#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub organization_id: Option<String>,
    pub status: Option<ScenarioStatus>,
    pub limit: Option<u64>,
}

impl ScenarioFilter {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_SCENARIO_LIMIT)
            .clamp(1, MAX_SCENARIO_LIMIT)
    }
}

#[derive(Debug, Clone)]
pub struct RoiRequest {
    pub calculation_type: CalculationType,
    pub assumptions: RoiAssumptions,
    pub iterations: Option<usize>,
}

impl RoiRequest {
    pub fn effective_iterations(&self) -> usize {
        self.iterations
            .unwrap_or(DEFAULT_MONTE_CARLO_ITERATIONS)
            .clamp(1, MAX_MONTE_CARLO_ITERATIONS)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparisonReport {
    pub scenario_id: Uuid,
    #[serde(flatten)]
    pub analysis: ScenarioEngineResult,
    /// baseline - variant (削減額が正)
    pub net_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiSummary {
    #[serde(rename = "latestROI")]
    pub latest_roi: f64,
    pub latest_payback: f64,
    pub calculation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiHistory {
    pub calculations: Vec<RoiCalculation>,
    pub summary: Option<RoiSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiResult {
    pub calculation: RoiCalculation,
    pub analysis: RoiAnalysis,
}

/// 計算履歴 (古い順) の要約。空なら None
pub fn summarize_roi(calculations: &[RoiCalculation]) -> Option<RoiSummary> {
    calculations.last().map(|latest| RoiSummary {
        latest_roi: latest.roi_percentage,
        latest_payback: latest.payback_months,
        calculation_count: calculations.len(),
    })
}

fn parse_baseline(scenario: &Scenario) -> AppResult<OrganizationalBaseline> {
    serde_json::from_value(scenario.baseline_data.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid baseline data: {}", e)))
}

fn parse_variant(value: Value) -> AppResult<OrganizationalVariant> {
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid variant data: {}", e)))
}

pub struct ScenarioService {
    scenario_repo: ScenarioRepository,
    feature_flags: Arc<FeatureFlagService>,
}

impl ScenarioService {
    pub fn new(db: DbPool, feature_flags: Arc<FeatureFlagService>) -> Self {
        Self {
            scenario_repo: ScenarioRepository::new(db),
            feature_flags,
        }
    }

    /// 作成者 (または管理者) のみ
    async fn load(&self, id: Uuid, actor: &Actor) -> AppResult<Scenario> {
        let scenario = self
            .scenario_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Scenario not found".to_string()))?;
        if scenario.created_by != actor.user_id && !actor.is_admin {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        Ok(scenario)
    }

    pub async fn list(&self, actor: &Actor, filter: ScenarioFilter) -> AppResult<Vec<Scenario>> {
        self.scenario_repo
            .find_filtered(
                actor.user_id,
                filter.organization_id.as_deref(),
                filter.status,
                filter.effective_limit(),
            )
            .await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        organization_id: &str,
        title: &str,
        description: &str,
        baseline_data: Value,
        variant_data: Value,
    ) -> AppResult<Scenario> {
        let scenario = self
            .scenario_repo
            .create(NewScenario {
                organization_id: organization_id.to_string(),
                title: title.trim().to_string(),
                description: Some(description.to_string()),
                baseline_data,
                variant_data,
                created_by: actor.user_id,
            })
            .await?;
        info!(scenario_id = %scenario.id, organization_id = %organization_id, "Scenario created");
        Ok(scenario)
    }

    pub async fn get(&self, id: Uuid, actor: &Actor) -> AppResult<Scenario> {
        self.load(id, actor).await
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> AppResult<()> {
        self.load(id, actor).await?;
        if !self.scenario_repo.delete(id).await? {
            return Err(AppError::NotFound("Scenario not found".to_string()));
        }
        info!(scenario_id = %id, "Scenario deleted");
        Ok(())
    }

    /// 保存済みのベースラインと案 (または差し替えの案) を比較する
    pub async fn compare(
        &self,
        id: Uuid,
        actor: &Actor,
        variant_override: Option<Value>,
    ) -> AppResult<ScenarioComparisonReport> {
        let scenario = self.load(id, actor).await?;
        let baseline = parse_baseline(&scenario)?;
        let variant = parse_variant(variant_override.unwrap_or(scenario.variant_data))?;

        let analysis = run_scenario_engine(&baseline, &variant);
        let legacy = compare_scenarios(
            &positions_from_chart(&baseline.organization_chart),
            &positions_from_chart(&variant.proposed_chart),
        );

        Ok(ScenarioComparisonReport {
            scenario_id: id,
            analysis,
            net_savings: legacy.delta_cost,
        })
    }

    pub async fn roi_history(&self, id: Uuid, actor: &Actor) -> AppResult<RoiHistory> {
        self.load(id, actor).await?;
        let calculations = self.scenario_repo.find_roi_calculations(id).await?;
        Ok(RoiHistory {
            summary: summarize_roi(&calculations),
            calculations,
        })
    }

    /// ROI を計算して保存する。モンテカルロは機能フラグで制御
    pub async fn calculate_roi(
        &self,
        id: Uuid,
        actor: &Actor,
        request: RoiRequest,
        ctx: &FeatureContext,
    ) -> AppResult<RoiResult> {
        if request.calculation_type == CalculationType::MonteCarlo {
            self.feature_flags.require(MONTE_CARLO_FLAG, ctx)?;
        }

        let scenario = self.load(id, actor).await?;
        let baseline = parse_baseline(&scenario)?;
        let variant = parse_variant(scenario.variant_data.clone())?;

        let iterations = request.effective_iterations();
        let analysis = calculate_roi(
            &baseline,
            &variant,
            request.calculation_type,
            request.assumptions,
            iterations,
        );

        let metrics = analysis.financial_metrics;
        let calculation = self
            .scenario_repo
            .create_roi_calculation(NewRoiCalculation {
                scenario_id: id,
                calculation_type: analysis.calculation_type.to_string(),
                assumptions: json!(analysis.assumptions),
                results: json!({
                    "financialMetrics": metrics,
                    "sensitivityAnalysis": analysis.sensitivity_analysis,
                    "monteCarloResults": analysis.monte_carlo_results,
                    "recommendations": analysis.recommendations,
                }),
                roi_percentage: metrics.roi_percentage,
                payback_months: metrics.payback_period,
                npv: metrics.npv,
                calculated_by: actor.user_id,
            })
            .await?;

        info!(
            scenario_id = %id,
            calculation_type = %analysis.calculation_type,
            roi = metrics.roi_percentage,
            "ROI calculated"
        );

        Ok(RoiResult {
            calculation,
            analysis,
        })
    }
}
