// northpath-backend/src/api/dto/payment_dto.rs

use crate::domain::payment_history_model::Model as PaymentHistory;
use crate::service::payment_service::format_amount;
use crate::utils::validation::validate_tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// チェックアウトセッション作成リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[validate(custom(function = "validate_tier"))]
    pub tier: String,

    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,

    #[validate(length(max = 100, message = "Customer name cannot exceed 100 characters"))]
    pub customer_name: Option<String>,

    pub assessment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryItem {
    pub id: Uuid,
    pub tier: String,
    pub assessment_id: Option<Uuid>,
    pub amount: i64,
    pub amount_display: String,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentHistory> for PaymentHistoryItem {
    fn from(payment: PaymentHistory) -> Self {
        Self {
            amount_display: format_amount(payment.amount, &payment.currency),
            id: payment.id,
            tier: payment.tier,
            assessment_id: payment.assessment_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            description: payment.description,
            paid_at: payment.paid_at,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_validation() {
        let valid = CreateSessionRequest {
            tier: "monthly-subscription".to_string(),
            customer_email: Some("buyer@example.edu".to_string()),
            customer_name: None,
            assessment_id: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateSessionRequest {
            tier: "pro".to_string(),
            customer_email: Some("not-an-email".to_string()),
            customer_name: None,
            assessment_id: None,
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("tier"));
        assert!(errors.field_errors().contains_key("customer_email"));
    }
}
