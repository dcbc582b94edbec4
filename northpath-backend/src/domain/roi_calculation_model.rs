// northpath-backend/src/domain/roi_calculation_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// シナリオに対するROI計算結果
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roi_calculations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub calculation_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub assumptions: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub results: Json,
    pub roi_percentage: f64,
    pub payback_months: f64,
    pub npv: f64,
    pub calculated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scenario_model::Entity",
        from = "Column::ScenarioId",
        to = "super::scenario_model::Column::Id",
        on_delete = "Cascade"
    )]
    Scenario,
}

impl Related<super::scenario_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
