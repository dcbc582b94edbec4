// northpath-backend/src/api/handlers/payment_handler.rs

use crate::api::dto::payment_dto::{CreateSessionRequest, PaymentHistoryItem, WebhookAck};
use crate::api::dto::tier_dto::parse_tier;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::service::payment_service::{CheckoutRequest, CheckoutSessionInfo};
use crate::types::{ApiResponse, PaginatedResponse, PaginationQuery};
use axum::{
    extract::{Json, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use tracing::{info, warn};
use validator::Validate;

/// チェックアウトセッション作成
pub async fn create_session_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSessionInfo>>> {
    payload.validate()?;
    let tier = parse_tier(&payload.tier)?;

    info!(
        user_id = %user.user_id(),
        tier = %tier,
        "Creating checkout session"
    );

    let session = app_state
        .payment_service
        .create_checkout_session(CheckoutRequest {
            tier,
            user_id: user.user_id(),
            customer_email: payload
                .customer_email
                .or_else(|| Some(user.email().to_string())),
            customer_name: payload.customer_name,
            assessment_id: payload.assessment_id,
        })
        .await?;

    info!(
        user_id = %user.user_id(),
        session_id = %session.session_id,
        "Checkout session created successfully"
    );

    Ok(Json(ApiResponse::success(
        "Checkout session created successfully",
        session,
    )))
}

/// Stripe Webhook。署名検証は生の本文に対して行う
pub async fn stripe_webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing stripe-signature header");
            AppError::BadRequest("No signature provided".to_string())
        })?;

    app_state
        .payment_service
        .handle_webhook(&body, signature)
        .await?;

    Ok(Json(WebhookAck { received: true }))
}

/// 支払い履歴
pub async fn payment_history_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<PaymentHistoryItem>>>> {
    let (page, per_page) = query.get_pagination();
    let (payments, total) = app_state
        .payment_service
        .get_payment_history(user.user_id(), page, per_page)
        .await?;

    let items = payments.into_iter().map(PaymentHistoryItem::from).collect();

    Ok(Json(ApiResponse::success(
        "Payment history retrieved successfully",
        PaginatedResponse::new(items, page, per_page, total),
    )))
}

pub fn payment_public_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/payments/webhook", post(stripe_webhook_handler))
        .with_state(app_state)
}

pub fn payment_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/payments/create-session", post(create_session_handler))
        .route("/api/payments/history", get(payment_history_handler))
        .with_state(app_state)
}
