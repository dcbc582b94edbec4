// northpath-backend/src/service/subscription_service.rs

use crate::db::DbPool;
use crate::domain::assessment_model::Model as Assessment;
use crate::domain::assessment_status::SubscriptionStatus;
use crate::domain::pricing_tier::PricingTier;
use crate::error::AppResult;
use crate::repository::assessment_repository::AssessmentRepository;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// 月額契約の猶予期間 (日)
const MONTHLY_GRACE_PERIOD_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub is_valid: bool,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiration: Option<i64>,
    pub grace_period_days: i64,
}

impl SubscriptionState {
    fn unpaid() -> Self {
        Self {
            is_valid: false,
            status: SubscriptionStatus::Unpaid,
            expires_at: None,
            last_payment_date: None,
            days_until_expiration: None,
            grace_period_days: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Granted,
    Limited,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheck {
    pub access: AccessLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionState>,
}

impl AccessCheck {
    pub fn is_allowed(&self) -> bool {
        self.access != AccessLevel::Denied
    }
}

fn grace_period_days(tier: PricingTier) -> i64 {
    if tier == PricingTier::MonthlySubscription {
        MONTHLY_GRACE_PERIOD_DAYS
    } else {
        0
    }
}

/// 1日未満の端数は切り上げ
fn days_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expires_at - now).num_milliseconds();
    (millis as f64 / Duration::days(1).num_milliseconds() as f64).ceil() as i64
}

/// 最新の診断レコードから契約状態を判定する
pub fn evaluate_status(
    assessment: Option<&Assessment>,
    tier: PricingTier,
    now: DateTime<Utc>,
) -> SubscriptionState {
    let Some(assessment) = assessment else {
        return SubscriptionState::unpaid();
    };

    let grace_period_days = grace_period_days(tier);
    let stored = assessment
        .subscription_state()
        .unwrap_or(SubscriptionStatus::Unpaid);

    let Some(expires_at) = assessment.subscription_expires_at else {
        return SubscriptionState {
            is_valid: false,
            status: stored,
            expires_at: None,
            last_payment_date: assessment.last_payment_date,
            days_until_expiration: None,
            grace_period_days,
        };
    };

    let days = days_until(expires_at, now);
    let (status, is_valid) = if now <= expires_at {
        (SubscriptionStatus::Active, true)
    } else if days >= -grace_period_days {
        (SubscriptionStatus::GracePeriod, true)
    } else {
        (SubscriptionStatus::Expired, false)
    };

    SubscriptionState {
        is_valid,
        status,
        expires_at: Some(expires_at),
        last_payment_date: assessment.last_payment_date,
        days_until_expiration: Some(days),
        grace_period_days,
    }
}

/// ティアと契約状態からアクセス可否を決める
pub fn access_for(tier: PricingTier, state: Option<SubscriptionState>) -> AccessCheck {
    if tier.is_one_time() {
        return AccessCheck {
            access: AccessLevel::Granted,
            reason: None,
            upgrade_required: None,
            subscription_status: None,
        };
    }

    let state = state.unwrap_or_else(SubscriptionState::unpaid);
    if !state.is_valid {
        return AccessCheck {
            access: AccessLevel::Denied,
            reason: Some(format!("Subscription {}", state.status)),
            upgrade_required: Some(true),
            subscription_status: Some(state),
        };
    }

    if state.status == SubscriptionStatus::GracePeriod {
        return AccessCheck {
            access: AccessLevel::Limited,
            reason: Some("Subscription in grace period".to_string()),
            upgrade_required: None,
            subscription_status: Some(state),
        };
    }

    AccessCheck {
        access: AccessLevel::Granted,
        reason: None,
        upgrade_required: None,
        subscription_status: Some(state),
    }
}

/// 支払い後の新しい有効期限。期限管理のないティアは None
pub fn next_expiration(
    tier: PricingTier,
    now: DateTime<Utc>,
    next_billing_date: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let default = match tier {
        PricingTier::MonthlySubscription | PricingTier::ComprehensivePackage => {
            now + Duration::days(30)
        }
        PricingTier::EnterpriseTransformation => now + Duration::days(365),
        _ => return None,
    };
    Some(next_billing_date.unwrap_or(default))
}

pub struct SubscriptionService {
    assessment_repo: AssessmentRepository,
}

impl SubscriptionService {
    pub fn new(db: DbPool) -> Self {
        Self {
            assessment_repo: AssessmentRepository::new(db),
        }
    }

    /// 利用者とティアの契約状態
    pub async fn status(&self, user_id: Uuid, tier: PricingTier) -> AppResult<SubscriptionState> {
        let latest = self
            .assessment_repo
            .find_latest_for_user_and_tier(user_id, tier)
            .await?;
        Ok(evaluate_status(latest.as_ref(), tier, Utc::now()))
    }

    pub async fn check_access(&self, user_id: Uuid, tier: PricingTier) -> AppResult<AccessCheck> {
        if tier.is_one_time() {
            return Ok(access_for(tier, None));
        }
        let state = self.status(user_id, tier).await?;
        Ok(access_for(tier, Some(state)))
    }

    /// 支払い完了後に有効期限を延長する
    pub async fn update_expiration(
        &self,
        assessment: Assessment,
        tier: PricingTier,
        next_billing_date: Option<DateTime<Utc>>,
    ) -> AppResult<Assessment> {
        let now = Utc::now();
        let Some(expires_at) = next_expiration(tier, now, next_billing_date) else {
            return Ok(assessment);
        };

        let assessment_id = assessment.id;
        let updated = self
            .assessment_repo
            .update_subscription(
                assessment,
                SubscriptionStatus::Active,
                Some(expires_at),
                Some(now),
            )
            .await?;

        info!(
            assessment_id = %assessment_id,
            tier = %tier,
            expires_at = %expires_at,
            "Subscription expiration updated"
        );
        Ok(updated)
    }

    pub async fn set_status(
        &self,
        assessment: Assessment,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Assessment> {
        self.assessment_repo
            .update_subscription(assessment, status, expires_at, None)
            .await
    }

    pub async fn cancel(&self, assessment: Assessment) -> AppResult<Assessment> {
        info!(assessment_id = %assessment.id, "Cancelling subscription");
        self.set_status(assessment, SubscriptionStatus::Cancelled, None)
            .await
    }

    /// `days` 日以内に期限を迎える継続課金
    pub async fn expiring(&self, days: i64) -> AppResult<Vec<Assessment>> {
        let now = Utc::now();
        self.assessment_repo
            .find_expiring_subscriptions(now, now + Duration::days(days))
            .await
    }
}
