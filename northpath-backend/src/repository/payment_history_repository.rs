// northpath-backend/src/repository/payment_history_repository.rs

use crate::domain::payment_history_model::{
    ActiveModel as PaymentHistoryActiveModel, Column as PaymentHistoryColumn,
    Entity as PaymentHistoryEntity, Model as PaymentHistory, PaymentStatus,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct PaymentHistoryRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentHistory {
    pub user_id: Uuid,
    pub assessment_id: Option<Uuid>,
    pub tier: String,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_invoice_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentHistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: CreatePaymentHistory) -> AppResult<PaymentHistory> {
        let now = Utc::now();
        let active_model = PaymentHistoryActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(data.user_id),
            assessment_id: Set(data.assessment_id),
            tier: Set(data.tier),
            stripe_session_id: Set(data.stripe_session_id),
            stripe_payment_intent_id: Set(data.stripe_payment_intent_id),
            stripe_invoice_id: Set(data.stripe_invoice_id),
            amount: Set(data.amount),
            currency: Set(data.currency),
            status: Set(data.status.as_str().to_string()),
            description: Set(data.description),
            paid_at: Set(data.paid_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active_model.insert(&self.db).await.map_err(map_db_error)
    }

    pub async fn find_by_session_id(&self, session_id: &str) -> AppResult<Option<PaymentHistory>> {
        PaymentHistoryEntity::find()
            .filter(PaymentHistoryColumn::StripeSessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// ユーザーの支払い履歴 (新しい順)
    pub async fn find_by_user_id_paginated(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PaymentHistory>, u64)> {
        let paginator = PaymentHistoryEntity::find()
            .filter(PaymentHistoryColumn::UserId.eq(user_id))
            .order_by_desc(PaymentHistoryColumn::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await.map_err(map_db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(map_db_error)?;

        Ok((items, total))
    }
}
