// northpath-backend/src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Multiple validation errors")]
    ValidationErrors(Vec<String>),

    #[error("Failed to parse UUID: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Feature not available: {0}")]
    FeatureUnavailable(String),

    #[error("Subscription access required for {tier}: {reason}")]
    SubscriptionRequired {
        tier: String,
        reason: String,
        requires_upgrade: bool,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    /// エラー種別に対応するHTTPステータス
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DbErr(DbErr::RecordNotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::DbErr(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_)
            | AppError::ValidationErrors(_)
            | AppError::UuidError(_)
            | AppError::ValidationFailure(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::FeatureUnavailable(_)
            | AppError::SubscriptionRequired { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::ExternalServiceError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl ErrorResponse {
    fn simple(error_type: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: message.clone(),
            message,
            details: None,
            validation_errors: None,
            errors: None,
            error_type: error_type.to_string(),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn validation(field_errors: HashMap<String, Vec<String>>, errors: Vec<serde_json::Value>) -> Self {
        Self {
            validation_errors: Some(field_errors),
            errors: Some(errors),
            ..Self::simple("validation_errors", "Validation failed")
        }
    }
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::DbErr(db_err) => {
                tracing::error!(error = ?db_err, "Database error");

                // クライアントには詳細を出さない
                match &db_err {
                    DbErr::RecordNotFound(entity) => ErrorResponse::simple(
                        "database_error",
                        "The requested resource was not found",
                    )
                    .with_details(json!({ "entity": entity })),
                    DbErr::Exec(_) => {
                        ErrorResponse::simple("database_error", "A database operation failed")
                            .with_details(json!({ "operation": "exec" }))
                    }
                    DbErr::Query(_) => {
                        ErrorResponse::simple("database_error", "A database query failed")
                            .with_details(json!({ "operation": "query" }))
                    }
                    _ => ErrorResponse::simple("database_error", "A database error occurred"),
                }
            }
            AppError::NotFound(message) => ErrorResponse::simple("not_found", message),
            AppError::ValidationError(message) => {
                ErrorResponse::simple("validation_error", message)
            }
            AppError::ValidationErrors(errors) => {
                let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
                for error in &errors {
                    if let Some((field, message)) = error.split_once(": ") {
                        field_errors
                            .entry(field.to_string())
                            .or_default()
                            .push(message.to_string());
                    }
                }
                let errors_array = errors.iter().map(|e| json!({ "message": e })).collect();
                ErrorResponse::validation(field_errors, errors_array)
            }
            AppError::UuidError(err) => {
                ErrorResponse::simple("invalid_uuid", format!("Invalid UUID: {}", err))
            }
            AppError::ValidationFailure(errors) => {
                let field_errors: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let messages = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                let errors_array = field_errors
                    .iter()
                    .flat_map(|(field, messages)| {
                        messages
                            .iter()
                            .map(move |msg| json!({ "message": format!("{}: {}", field, msg) }))
                    })
                    .collect();
                ErrorResponse::validation(field_errors, errors_array)
            }
            AppError::BadRequest(message) => ErrorResponse::simple("bad_request", message),
            AppError::Unauthorized(message) => ErrorResponse::simple("unauthorized", message),
            AppError::Forbidden(message) => ErrorResponse::simple("forbidden", message),
            AppError::FeatureUnavailable(feature) => ErrorResponse {
                error: "Feature not available".to_string(),
                message: "This feature is not enabled for your account".to_string(),
                ..ErrorResponse::simple("feature_unavailable", "")
            }
            .with_details(json!({ "feature": feature })),
            AppError::SubscriptionRequired {
                tier,
                reason,
                requires_upgrade,
            } => ErrorResponse {
                error: "Subscription access required".to_string(),
                message: reason.clone(),
                ..ErrorResponse::simple("subscription_required", "")
            }
            .with_details(json!({
                "reason": reason,
                "requiresUpgrade": requires_upgrade,
                "tier": tier,
            })),
            AppError::Conflict(message) => ErrorResponse::simple("conflict", message),
            AppError::Gone(message) => ErrorResponse::simple("gone", message),
            AppError::InternalServerError(message) => {
                tracing::error!(error = %message, "Internal server error");
                ErrorResponse::simple(
                    "internal_server_error",
                    "An internal server error occurred",
                )
            }
            AppError::ExternalServiceError(message) => {
                tracing::error!(error = %message, "External service error");
                ErrorResponse {
                    error: "External service error".to_string(),
                    ..ErrorResponse::simple("external_service_error", message)
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
    pub error_type: String,
}
