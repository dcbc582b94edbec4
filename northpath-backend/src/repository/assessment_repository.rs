// northpath-backend/src/repository/assessment_repository.rs

use crate::domain::assessment_model::{
    ActiveModel as AssessmentActiveModel, Column as AssessmentColumn, Entity as AssessmentEntity,
    Model as Assessment,
};
use crate::domain::assessment_status::SubscriptionStatus;
use crate::domain::pricing_tier::PricingTier;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct AssessmentRepository {
    db: DatabaseConnection,
}

impl AssessmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, assessment: AssessmentActiveModel) -> AppResult<Assessment> {
        assessment.insert(&self.db).await.map_err(map_db_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assessment>> {
        AssessmentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_stripe_session_id(&self, session_id: &str) -> AppResult<Option<Assessment>> {
        AssessmentEntity::find()
            .filter(AssessmentColumn::StripeSessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// ユーザーが所有する (または連絡先メールが一致する) 診断をページングで取得
    pub async fn find_for_user_paginated(
        &self,
        user_id: Uuid,
        email: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Assessment>, u64)> {
        let paginator = AssessmentEntity::find()
            .filter(
                Condition::any()
                    .add(AssessmentColumn::UserId.eq(user_id))
                    .add(AssessmentColumn::ContactEmail.eq(email)),
            )
            .order_by_desc(AssessmentColumn::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await.map_err(map_db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(map_db_error)?;

        Ok((items, total))
    }

    /// ユーザー×ティアの最新の診断
    pub async fn find_latest_for_user_and_tier(
        &self,
        user_id: Uuid,
        tier: PricingTier,
    ) -> AppResult<Option<Assessment>> {
        AssessmentEntity::find()
            .filter(AssessmentColumn::UserId.eq(user_id))
            .filter(AssessmentColumn::Tier.eq(tier.as_str()))
            .order_by_desc(AssessmentColumn::CreatedAt)
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_created_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Assessment>> {
        AssessmentEntity::find()
            .filter(AssessmentColumn::CreatedAt.gte(since))
            .order_by_desc(AssessmentColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_recent(&self, limit: u64) -> AppResult<Vec<Assessment>> {
        AssessmentEntity::find()
            .order_by_desc(AssessmentColumn::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// 期限が [from, until] に入る有効な継続課金の診断
    pub async fn find_expiring_subscriptions(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Assessment>> {
        let subscription_tiers: Vec<&str> = PricingTier::all()
            .into_iter()
            .filter(PricingTier::is_subscription)
            .map(|tier| tier.as_str())
            .collect();

        AssessmentEntity::find()
            .filter(AssessmentColumn::Tier.is_in(subscription_tiers))
            .filter(AssessmentColumn::SubscriptionStatus.eq(SubscriptionStatus::Active.as_str()))
            .filter(AssessmentColumn::SubscriptionExpiresAt.gte(from))
            .filter(AssessmentColumn::SubscriptionExpiresAt.lte(until))
            .order_by_asc(AssessmentColumn::SubscriptionExpiresAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// 契約情報を更新
    pub async fn update_subscription(
        &self,
        assessment: Assessment,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
        last_payment_date: Option<DateTime<Utc>>,
    ) -> AppResult<Assessment> {
        let mut active_model: AssessmentActiveModel = assessment.into();
        active_model.subscription_status = Set(Some(status.as_str().to_string()));
        if let Some(expires_at) = expires_at {
            active_model.subscription_expires_at = Set(Some(expires_at));
        }
        if let Some(paid_at) = last_payment_date {
            active_model.last_payment_date = Set(Some(paid_at));
        }
        active_model.update(&self.db).await.map_err(map_db_error)
    }

    /// Stripe セッションIDで該当する全診断の契約状態を更新
    pub async fn update_subscription_status_by_session(
        &self,
        session_id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<u64> {
        let result = AssessmentEntity::update_many()
            .col_expr(
                AssessmentColumn::SubscriptionStatus,
                sea_orm::sea_query::Expr::value(status.as_str()),
            )
            .col_expr(
                AssessmentColumn::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(AssessmentColumn::StripeSessionId.eq(session_id))
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected)
    }
}
