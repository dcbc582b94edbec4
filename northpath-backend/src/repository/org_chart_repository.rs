// northpath-backend/src/repository/org_chart_repository.rs

use crate::domain::org_chart_model::{
    ActiveModel as OrgChartActiveModel, Column as OrgChartColumn, Entity as OrgChartEntity,
    Model as OrgChart,
};
use crate::error::{AppError, AppResult};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct OrgChartRepository {
    db: DatabaseConnection,
}

/// 保存する組織図の内容
pub struct NewOrgChart {
    pub assessment_id: Uuid,
    pub name: String,
    pub svg_content: Option<String>,
    pub roles: Value,
    pub scenarios: Value,
    pub issues: Value,
}

impl OrgChartRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, chart: NewOrgChart) -> AppResult<OrgChart> {
        OrgChartActiveModel {
            assessment_id: Set(chart.assessment_id),
            name: Set(chart.name),
            svg_content: Set(chart.svg_content),
            roles: Set(chart.roles),
            scenarios: Set(chart.scenarios),
            issues: Set(chart.issues),
            ..OrgChartActiveModel::new()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_error)
    }

    /// 最新の組織図
    pub async fn find_latest_by_assessment(&self, assessment_id: Uuid) -> AppResult<Option<OrgChart>> {
        OrgChartEntity::find()
            .filter(OrgChartColumn::AssessmentId.eq(assessment_id))
            .order_by_desc(OrgChartColumn::CreatedAt)
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }
}
