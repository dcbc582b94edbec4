// northpath-backend/src/domain/scenario_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scenarios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub baseline_data: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub variant_data: Json,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::roi_calculation_model::Entity")]
    RoiCalculations,
}

impl Related<super::roi_calculation_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoiCalculations.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            status: Set(ScenarioStatus::Draft.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

/// シナリオの承認ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Draft => "DRAFT",
            ScenarioStatus::UnderReview => "UNDER_REVIEW",
            ScenarioStatus::Approved => "APPROVED",
            ScenarioStatus::Rejected => "REJECTED",
            ScenarioStatus::Implemented => "IMPLEMENTED",
        }
    }
}

impl std::fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScenarioStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(ScenarioStatus::Draft),
            "UNDER_REVIEW" => Ok(ScenarioStatus::UnderReview),
            "APPROVED" => Ok(ScenarioStatus::Approved),
            "REJECTED" => Ok(ScenarioStatus::Rejected),
            "IMPLEMENTED" => Ok(ScenarioStatus::Implemented),
            _ => Err(format!("Invalid scenario status: {}", s)),
        }
    }
}
