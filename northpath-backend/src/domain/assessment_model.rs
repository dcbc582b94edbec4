// northpath-backend/src/domain/assessment_model.rs

use super::assessment_status::{AssessmentStatus, SubscriptionStatus};
use super::pricing_tier::PricingTier;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

/// 診断エンティティ
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assessments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    pub tier: String,
    pub assessment_type: String,
    pub organization_type: String,
    #[sea_orm(nullable)]
    pub institution_name: Option<String>,
    #[sea_orm(nullable)]
    pub contact_email: Option<String>,
    #[sea_orm(nullable)]
    pub contact_name: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub responses: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub uploaded_files: Json,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub analysis_results: Option<Json>,
    #[sea_orm(nullable)]
    pub ai_readiness_score: Option<f64>,
    #[sea_orm(nullable)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub subscription_status: Option<String>,
    #[sea_orm(nullable)]
    pub subscription_expires_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub last_payment_date: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub stripe_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assessment_collaborator_model::Entity")]
    Collaborators,
    #[sea_orm(has_many = "super::assessment_comment_model::Entity")]
    Comments,
    #[sea_orm(has_many = "super::org_chart_model::Entity")]
    OrgCharts,
}

impl Related<super::assessment_collaborator_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collaborators.def()
    }
}

impl Related<super::assessment_comment_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::org_chart_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrgCharts.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
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

impl Model {
    pub fn pricing_tier(&self) -> Option<PricingTier> {
        self.tier.parse().ok()
    }

    pub fn assessment_status(&self) -> Option<AssessmentStatus> {
        self.status.parse().ok()
    }

    pub fn subscription_state(&self) -> Option<SubscriptionStatus> {
        self.subscription_status.as_deref().and_then(|s| s.parse().ok())
    }

    /// 回答件数 (配列・オブジェクトいずれの形式でも数える)
    pub fn response_count(&self) -> usize {
        match &self.responses {
            Json::Array(items) => items.len(),
            Json::Object(map) => map.len(),
            _ => 0,
        }
    }

    /// 所有者または匿名提出時の連絡先メールで本人確認する
    pub fn is_owned_by(&self, user_id: Uuid, email: &str) -> bool {
        self.user_id == Some(user_id)
            || self
                .contact_email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
    }
}
