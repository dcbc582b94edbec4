// northpath-backend/src/domain/payment_history_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(nullable)]
    pub assessment_id: Option<Uuid>,

    pub tier: String,

    #[sea_orm(nullable)]
    pub stripe_session_id: Option<String>,

    #[sea_orm(unique, nullable)]
    pub stripe_payment_intent_id: Option<String>,

    #[sea_orm(unique, nullable)]
    pub stripe_invoice_id: Option<String>,

    /// セント単位
    pub amount: i64,

    #[sea_orm(default_value = "usd")]
    pub currency: String,

    pub status: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    #[sea_orm(nullable)]
    pub paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// 支払いステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Pending,
    Canceled,
    RequiresAction,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::RequiresAction => "requires_action",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "pending" => Ok(PaymentStatus::Pending),
            "canceled" => Ok(PaymentStatus::Canceled),
            "requires_action" => Ok(PaymentStatus::RequiresAction),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl Model {
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.status.parse().ok()
    }
}
