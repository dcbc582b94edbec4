// northpath-backend/src/repository/scenario_repository.rs

use crate::domain::roi_calculation_model::{
    ActiveModel as RoiCalculationActiveModel, Column as RoiCalculationColumn,
    Entity as RoiCalculationEntity, Model as RoiCalculation,
};
use crate::domain::scenario_model::{
    ActiveModel as ScenarioActiveModel, Column as ScenarioColumn, Entity as ScenarioEntity,
    Model as Scenario, ScenarioStatus,
};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct ScenarioRepository {
    db: DatabaseConnection,
}

pub struct NewScenario {
    pub organization_id: String,
    pub title: String,
    pub description: Option<String>,
    pub baseline_data: Value,
    pub variant_data: Value,
    pub created_by: Uuid,
}

pub struct NewRoiCalculation {
    pub scenario_id: Uuid,
    pub calculation_type: String,
    pub assumptions: Value,
    pub results: Value,
    pub roi_percentage: f64,
    pub payback_months: f64,
    pub npv: f64,
    pub calculated_by: Uuid,
}

impl ScenarioRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, scenario: NewScenario) -> AppResult<Scenario> {
        ScenarioActiveModel {
            organization_id: Set(scenario.organization_id),
            title: Set(scenario.title),
            description: Set(scenario.description),
            baseline_data: Set(scenario.baseline_data),
            variant_data: Set(scenario.variant_data),
            created_by: Set(scenario.created_by),
            ..ScenarioActiveModel::new()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Scenario>> {
        ScenarioEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// 作成者・組織・ステータスで絞り込み (新しい順)
    pub async fn find_filtered(
        &self,
        created_by: Uuid,
        organization_id: Option<&str>,
        status: Option<ScenarioStatus>,
        limit: u64,
    ) -> AppResult<Vec<Scenario>> {
        let mut query = ScenarioEntity::find().filter(ScenarioColumn::CreatedBy.eq(created_by));

        if let Some(organization_id) = organization_id {
            query = query.filter(ScenarioColumn::OrganizationId.eq(organization_id));
        }
        if let Some(status) = status {
            query = query.filter(ScenarioColumn::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(ScenarioColumn::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ScenarioEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected > 0)
    }

    pub async fn create_roi_calculation(
        &self,
        calculation: NewRoiCalculation,
    ) -> AppResult<RoiCalculation> {
        let now = Utc::now();
        RoiCalculationActiveModel {
            id: Set(Uuid::new_v4()),
            scenario_id: Set(calculation.scenario_id),
            calculation_type: Set(calculation.calculation_type),
            assumptions: Set(calculation.assumptions),
            results: Set(calculation.results),
            roi_percentage: Set(calculation.roi_percentage),
            payback_months: Set(calculation.payback_months),
            npv: Set(calculation.npv),
            calculated_by: Set(calculation.calculated_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_error)
    }

    /// 計算日時の昇順
    pub async fn find_roi_calculations(&self, scenario_id: Uuid) -> AppResult<Vec<RoiCalculation>> {
        RoiCalculationEntity::find()
            .filter(RoiCalculationColumn::ScenarioId.eq(scenario_id))
            .order_by_asc(RoiCalculationColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }
}
