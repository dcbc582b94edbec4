// northpath-backend/src/service/payment_service.rs

use crate::config::stripe::{StripeConfig, STRIPE_CLIENT};
use crate::db::DbPool;
use crate::domain::assessment_model::Model as Assessment;
use crate::domain::assessment_status::SubscriptionStatus;
use crate::domain::payment_history_model::{Model as PaymentHistory, PaymentStatus};
use crate::domain::pricing_tier::{stripe_mapping, CheckoutMode, PricingTier};
use crate::error::{AppError, AppResult};
use crate::repository::assessment_repository::AssessmentRepository;
use crate::repository::payment_history_repository::{
    CreatePaymentHistory, PaymentHistoryRepository,
};
use crate::service::subscription_service::SubscriptionService;
use crate::utils::email::EmailService;
use crate::utils::validation::mask_email;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession,
    CreateCheckoutSessionInvoiceCreation, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionSubscriptionData, EventObject, EventType, Invoice, Subscription,
    SubscriptionStatus as StripeSubscriptionStatus, Webhook,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// チェックアウト作成の入力
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub tier: PricingTier,
    pub user_id: Uuid,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub assessment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionInfo {
    pub session_id: String,
    pub url: String,
    pub tier: PricingTier,
    pub mode: CheckoutMode,
}

/// セッションのメタデータ。サブスクリプションにも同じ内容を持たせる
pub fn checkout_metadata(request: &CheckoutRequest, now: DateTime<Utc>) -> HashMap<String, String> {
    let config = request.tier.config();
    let mut metadata = HashMap::from([
        ("user_id".to_string(), request.user_id.to_string()),
        ("tier".to_string(), request.tier.as_str().to_string()),
        ("tier_name".to_string(), config.name.to_string()),
        ("tier_price".to_string(), config.price.to_string()),
        (
            "customer_name".to_string(),
            request.customer_name.clone().unwrap_or_default(),
        ),
        ("purchased_at".to_string(), now.to_rfc3339()),
    ]);
    if let Some(assessment_id) = request.assessment_id {
        metadata.insert("assessment_id".to_string(), assessment_id.to_string());
    }
    metadata
}

/// Stripe の契約状態を診断側の状態に変換
pub fn map_stripe_status(status: StripeSubscriptionStatus) -> SubscriptionStatus {
    match status {
        StripeSubscriptionStatus::Active | StripeSubscriptionStatus::Trialing => {
            SubscriptionStatus::Active
        }
        StripeSubscriptionStatus::PastDue => SubscriptionStatus::GracePeriod,
        StripeSubscriptionStatus::Canceled | StripeSubscriptionStatus::IncompleteExpired => {
            SubscriptionStatus::Cancelled
        }
        _ => SubscriptionStatus::Unpaid,
    }
}

/// セント単位の金額を表示用に整形
pub fn format_amount(amount: i64, currency: &str) -> String {
    format!(
        "{:.2} {}",
        amount as f64 / 100.0,
        currency.to_uppercase()
    )
}

struct MetadataRef<'a>(&'a HashMap<String, String>);

impl MetadataRef<'_> {
    fn uuid(&self, key: &str) -> Option<Uuid> {
        self.0.get(key).and_then(|v| Uuid::parse_str(v).ok())
    }

    fn tier(&self) -> Option<PricingTier> {
        self.0.get("tier").and_then(|v| v.parse().ok())
    }
}

pub struct PaymentService {
    assessment_repo: AssessmentRepository,
    payment_history_repo: PaymentHistoryRepository,
    subscription_service: Arc<SubscriptionService>,
    email_service: Arc<EmailService>,
    stripe_config: StripeConfig,
    frontend_url: String,
}

impl PaymentService {
    pub fn new(
        db: DbPool,
        subscription_service: Arc<SubscriptionService>,
        email_service: Arc<EmailService>,
        stripe_config: StripeConfig,
        frontend_url: &str,
    ) -> Self {
        Self {
            assessment_repo: AssessmentRepository::new(db.clone()),
            payment_history_repo: PaymentHistoryRepository::new(db),
            subscription_service,
            email_service,
            stripe_config,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stripeチェックアウトセッションを作成
    pub async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutSessionInfo> {
        let tier = request.tier;
        let mapping = stripe_mapping(tier, self.stripe_config.get_price_id(tier));

        // 開発モードの場合はモックURLを返す
        if self.stripe_config.development_mode {
            let session_id = format!("cs_test_mock_{}", Uuid::new_v4().simple());
            info!(tier = %tier, "Development mode: returning mock checkout URL");
            return Ok(CheckoutSessionInfo {
                url: format!(
                    "{}/mock-checkout?session_id={}&tier={}",
                    self.frontend_url, session_id, tier
                ),
                session_id,
                tier,
                mode: mapping.stripe_mode,
            });
        }

        let price_id = mapping.stripe_price_id.clone().ok_or_else(|| {
            AppError::BadRequest(format!("No Stripe price configured for tier: {}", tier))
        })?;

        let success_url = format!(
            "{}{}&session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url, mapping.success_redirect
        );
        let cancel_url = format!("{}{}", self.frontend_url, mapping.cancel_redirect);
        let metadata = checkout_metadata(&request, Utc::now());

        let mut params = CreateCheckoutSession {
            cancel_url: Some(&cancel_url),
            success_url: Some(&success_url),
            customer_email: request.customer_email.as_deref(),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(price_id),
                quantity: Some(1),
                ..Default::default()
            }]),
            metadata: Some(metadata.clone()),
            ..Default::default()
        };

        match mapping.stripe_mode {
            CheckoutMode::Subscription => {
                params.mode = Some(CheckoutSessionMode::Subscription);
                params.subscription_data = Some(CreateCheckoutSessionSubscriptionData {
                    metadata: Some(metadata),
                    ..Default::default()
                });
            }
            CheckoutMode::Payment => {
                params.mode = Some(CheckoutSessionMode::Payment);
                params.invoice_creation = Some(CreateCheckoutSessionInvoiceCreation {
                    enabled: true,
                    invoice_data: None,
                });
            }
        }

        let session = CheckoutSession::create(&STRIPE_CLIENT, params)
            .await
            .map_err(|e| {
                error!(tier = %tier, error = %e, "Failed to create checkout session");

                // 価格IDエラーの場合、より具体的なメッセージを提供
                let message = if e.to_string().contains("No such price") {
                    format!(
                        "Stripe error: {}. Check that STRIPE_PRICE_* holds price IDs (price_...), not product IDs",
                        e
                    )
                } else {
                    format!("Stripe error: {}", e)
                };
                AppError::ExternalServiceError(message)
            })?;

        let url = session.url.ok_or_else(|| {
            AppError::InternalServerError("No checkout URL returned from Stripe".to_string())
        })?;

        info!(
            session_id = %session.id,
            tier = %tier,
            user_id = %request.user_id,
            "Checkout session created"
        );

        Ok(CheckoutSessionInfo {
            session_id: session.id.to_string(),
            url,
            tier,
            mode: mapping.stripe_mode,
        })
    }

    /// 署名を検証してイベントを取り出す
    fn parse_event(&self, payload: &str, signature: &str) -> AppResult<stripe::Event> {
        if self.stripe_config.development_mode || self.stripe_config.webhook_secret.is_empty() {
            if !self.stripe_config.development_mode {
                warn!("STRIPE_WEBHOOK_SECRET not set - skipping signature verification");
            }
            return serde_json::from_str::<stripe::Event>(payload).map_err(|e| {
                error!(error = %e, "Failed to parse webhook payload");
                AppError::BadRequest("Invalid webhook payload".to_string())
            });
        }

        Webhook::construct_event(payload, signature, &self.stripe_config.webhook_secret).map_err(
            |e| {
                warn!(error = %e, "Invalid webhook signature");
                AppError::BadRequest("Invalid signature".to_string())
            },
        )
    }

    /// Webhookイベントを処理
    pub async fn handle_webhook(&self, payload: &str, signature: &str) -> AppResult<()> {
        let event = self.parse_event(payload, signature)?;

        info!(event_id = %event.id, event_type = ?event.type_, "Processing webhook event");

        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    self.handle_checkout_completed(session).await?;
                }
            }
            EventType::CustomerSubscriptionDeleted => {
                if let EventObject::Subscription(subscription) = event.data.object {
                    self.handle_subscription_deleted(subscription).await?;
                }
            }
            EventType::CustomerSubscriptionUpdated => {
                if let EventObject::Subscription(subscription) = event.data.object {
                    self.handle_subscription_updated(subscription).await?;
                }
            }
            EventType::InvoicePaymentFailed => {
                if let EventObject::Invoice(invoice) = event.data.object {
                    self.handle_payment_failed(invoice).await?;
                }
            }
            _ => {
                debug!(event_type = ?event.type_, "Unhandled webhook event type");
            }
        }

        Ok(())
    }

    /// メタデータから対象の診断を探す (assessment_id 優先、なければ利用者とティアの最新)
    async fn resolve_assessment(
        &self,
        metadata: &HashMap<String, String>,
    ) -> AppResult<Option<Assessment>> {
        let metadata = MetadataRef(metadata);
        if let Some(assessment_id) = metadata.uuid("assessment_id") {
            if let Some(assessment) = self.assessment_repo.find_by_id(assessment_id).await? {
                return Ok(Some(assessment));
            }
        }
        match (metadata.uuid("user_id"), metadata.tier()) {
            (Some(user_id), Some(tier)) => {
                self.assessment_repo
                    .find_latest_for_user_and_tier(user_id, tier)
                    .await
            }
            _ => Ok(None),
        }
    }

    /// チェックアウト完了処理
    async fn handle_checkout_completed(&self, session: CheckoutSession) -> AppResult<()> {
        let session_id = session.id.to_string();

        // 同じセッションの再送は無視
        if self
            .payment_history_repo
            .find_by_session_id(&session_id)
            .await?
            .is_some()
        {
            info!(session_id = %session_id, "Checkout session already recorded");
            return Ok(());
        }

        let metadata = session.metadata.clone().unwrap_or_default();
        let meta = MetadataRef(&metadata);

        let user_id = meta.uuid("user_id").ok_or_else(|| {
            error!(session_id = %session_id, "Missing user_id in checkout session metadata");
            AppError::BadRequest("Invalid user_id in metadata".to_string())
        })?;
        let tier = meta.tier().ok_or_else(|| {
            error!(session_id = %session_id, "Missing tier in checkout session metadata");
            AppError::BadRequest("Missing tier in metadata".to_string())
        })?;

        let assessment = self.resolve_assessment(&metadata).await?;

        self.payment_history_repo
            .create(CreatePaymentHistory {
                user_id,
                assessment_id: assessment.as_ref().map(|a| a.id),
                tier: tier.as_str().to_string(),
                stripe_session_id: Some(session_id.clone()),
                stripe_payment_intent_id: session
                    .payment_intent
                    .as_ref()
                    .map(|pi| pi.id().to_string()),
                stripe_invoice_id: session.invoice.as_ref().map(|inv| inv.id().to_string()),
                amount: session.amount_total.unwrap_or(0),
                currency: session
                    .currency
                    .map_or_else(|| "usd".to_string(), |c| c.to_string()),
                status: PaymentStatus::Succeeded,
                description: Some(format!("{} purchase", tier.config().name)),
                paid_at: Some(Utc::now()),
            })
            .await?;

        match assessment {
            Some(assessment) => {
                self.subscription_service
                    .update_expiration(assessment, tier, None)
                    .await?;
            }
            None if tier.is_subscription() => {
                let updated = self
                    .assessment_repo
                    .update_subscription_status_by_session(&session_id, SubscriptionStatus::Active)
                    .await?;
                debug!(session_id = %session_id, updated, "Updated assessments by session");
            }
            None => {}
        }

        info!(
            session_id = %session_id,
            user_id = %user_id,
            tier = %tier,
            "Checkout completed"
        );
        Ok(())
    }

    /// サブスクリプション削除処理
    async fn handle_subscription_deleted(&self, subscription: Subscription) -> AppResult<()> {
        let Some(assessment) = self.resolve_assessment(&subscription.metadata).await? else {
            warn!(
                subscription_id = %subscription.id,
                "No assessment found for deleted subscription"
            );
            return Ok(());
        };

        if subscription.cancel_at_period_end {
            // 請求期間終了まで利用可能
            let period_end = DateTime::<Utc>::from_timestamp(subscription.current_period_end, 0);
            info!(
                subscription_id = %subscription.id,
                assessment_id = %assessment.id,
                period_end = ?period_end,
                "Subscription will end at period end"
            );
            self.subscription_service
                .set_status(assessment, SubscriptionStatus::Cancelled, period_end)
                .await?;
        } else {
            self.subscription_service.cancel(assessment).await?;
        }

        Ok(())
    }

    /// サブスクリプション更新処理
    async fn handle_subscription_updated(&self, subscription: Subscription) -> AppResult<()> {
        let Some(assessment) = self.resolve_assessment(&subscription.metadata).await? else {
            warn!(
                subscription_id = %subscription.id,
                "No assessment found for updated subscription"
            );
            return Ok(());
        };

        let status = map_stripe_status(subscription.status);
        let period_end = DateTime::<Utc>::from_timestamp(subscription.current_period_end, 0);

        info!(
            subscription_id = %subscription.id,
            assessment_id = %assessment.id,
            stripe_status = %subscription.status,
            status = %status,
            "Subscription updated"
        );

        self.subscription_service
            .set_status(assessment, status, period_end)
            .await?;
        Ok(())
    }

    /// 支払い失敗処理
    async fn handle_payment_failed(&self, invoice: Invoice) -> AppResult<()> {
        let invoice_id = invoice.id.to_string();
        let amount_due = invoice.amount_due.unwrap_or(0);
        let currency = invoice
            .currency
            .map_or_else(|| "usd".to_string(), |c| c.to_string());

        let metadata = invoice.metadata.clone().unwrap_or_default();
        let meta = MetadataRef(&metadata);
        if let Some(user_id) = meta.uuid("user_id") {
            self.payment_history_repo
                .create(CreatePaymentHistory {
                    user_id,
                    assessment_id: meta.uuid("assessment_id"),
                    tier: meta.tier().map(|t| t.as_str().to_string()).unwrap_or_default(),
                    stripe_session_id: None,
                    stripe_payment_intent_id: invoice
                        .payment_intent
                        .as_ref()
                        .map(|pi| pi.id().to_string()),
                    stripe_invoice_id: Some(invoice_id.clone()),
                    amount: amount_due,
                    currency: currency.clone(),
                    status: PaymentStatus::Failed,
                    description: Some("Payment failed".to_string()),
                    paid_at: None,
                })
                .await?;
        }

        warn!(
            invoice_id = %invoice_id,
            amount_due,
            "Invoice payment failed"
        );

        // 通知の失敗は Webhook の応答に影響させない
        if let Some(email) = invoice.customer_email.as_deref() {
            if let Err(e) = self
                .email_service
                .send_payment_failed(email, &format_amount(amount_due, &currency), &invoice_id)
                .await
            {
                warn!(
                    to_email = %mask_email(email),
                    error = %e,
                    "Failed to send payment failure notice"
                );
            }
        }

        Ok(())
    }

    /// ユーザーの支払い履歴を取得
    pub async fn get_payment_history(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PaymentHistory>, u64)> {
        self.payment_history_repo
            .find_by_user_id_paginated(user_id, page, per_page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_metadata_contents() {
        let user_id = Uuid::new_v4();
        let assessment_id = Uuid::new_v4();
        let request = CheckoutRequest {
            tier: PricingTier::MonthlySubscription,
            user_id,
            customer_email: Some("buyer@example.edu".to_string()),
            customer_name: Some("Dana".to_string()),
            assessment_id: Some(assessment_id),
        };
        let metadata = checkout_metadata(&request, Utc::now());

        assert_eq!(metadata["tier"], "monthly-subscription");
        assert_eq!(metadata["user_id"], user_id.to_string());
        assert_eq!(metadata["assessment_id"], assessment_id.to_string());
        assert_eq!(metadata["customer_name"], "Dana");
        assert!(metadata.contains_key("purchased_at"));
        assert_eq!(
            MetadataRef(&metadata).tier(),
            Some(PricingTier::MonthlySubscription)
        );
    }

    #[test]
    fn test_map_stripe_status() {
        assert_eq!(
            map_stripe_status(StripeSubscriptionStatus::Trialing),
            SubscriptionStatus::Active
        );
        assert_eq!(
            map_stripe_status(StripeSubscriptionStatus::PastDue),
            SubscriptionStatus::GracePeriod
        );
        assert_eq!(
            map_stripe_status(StripeSubscriptionStatus::Canceled),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(
            map_stripe_status(StripeSubscriptionStatus::Unpaid),
            SubscriptionStatus::Unpaid
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(249500, "usd"), "2495.00 USD");
        assert_eq!(format_amount(0, "eur"), "0.00 EUR");
    }
}
