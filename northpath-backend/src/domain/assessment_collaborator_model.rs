// northpath-backend/src/domain/assessment_collaborator_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assessment_collaborators")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub email: String,
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    pub role: String,
    pub invited_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assessment_model::Entity",
        from = "Column::AssessmentId",
        to = "super::assessment_model::Column::Id",
        on_delete = "Cascade"
    )]
    Assessment,
}

impl Related<super::assessment_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assessment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 共同編集者の権限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollaboratorRole {
    Admin,
    Collaborator,
    Viewer,
}

impl std::fmt::Display for CollaboratorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollaboratorRole::Admin => write!(f, "ADMIN"),
            CollaboratorRole::Collaborator => write!(f, "COLLABORATOR"),
            CollaboratorRole::Viewer => write!(f, "VIEWER"),
        }
    }
}

impl std::str::FromStr for CollaboratorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(CollaboratorRole::Admin),
            "COLLABORATOR" => Ok(CollaboratorRole::Collaborator),
            "VIEWER" => Ok(CollaboratorRole::Viewer),
            _ => Err(format!("Invalid collaborator role: {}", s)),
        }
    }
}

impl CollaboratorRole {
    /// 他の共同編集者を招待・削除できるか
    pub fn can_manage(&self) -> bool {
        matches!(self, CollaboratorRole::Admin)
    }

    /// コメントを書き込めるか
    pub fn can_comment(&self) -> bool {
        matches!(self, CollaboratorRole::Admin | CollaboratorRole::Collaborator)
    }
}

impl Model {
    pub fn collaborator_role(&self) -> CollaboratorRole {
        self.role.parse().unwrap_or(CollaboratorRole::Viewer)
    }
}
