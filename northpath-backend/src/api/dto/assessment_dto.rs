// northpath-backend/src/api/dto/assessment_dto.rs

use crate::domain::assessment_collaborator_model::CollaboratorRole;
use crate::domain::pricing_tier::PricingTier;
use crate::error::{AppError, AppResult};
use crate::service::assessment_service::{parse_ai_tier, NewSubmission};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

const MISSING_FIELDS: &str =
    "Missing required fields: tier, organizationType, and responses are required";
const DEFAULT_AI_INDUSTRY: &str = "higher-education";

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 組織診断の提出リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssessmentRequest {
    pub tier: Option<String>,
    pub organization_type: Option<String>,

    #[validate(length(max = 200, message = "Institution name cannot exceed 200 characters"))]
    pub institution_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    #[validate(length(max = 100, message = "Contact name cannot exceed 100 characters"))]
    pub contact_name: Option<String>,

    pub responses: Option<Value>,
    pub uploaded_files: Option<Value>,
}

impl SubmitAssessmentRequest {
    pub fn into_submission(self) -> AppResult<NewSubmission> {
        let (Some(tier), Some(organization_type), Some(responses)) = (
            present(self.tier),
            present(self.organization_type),
            self.responses.filter(|r| !r.is_null()),
        ) else {
            return Err(AppError::BadRequest(MISSING_FIELDS.to_string()));
        };

        Ok(NewSubmission {
            tier: tier.parse::<PricingTier>().map_err(AppError::BadRequest)?,
            organization_type,
            institution_name: present(self.institution_name),
            contact_email: present(self.contact_email),
            contact_name: present(self.contact_name),
            responses,
            uploaded_files: self.uploaded_files.unwrap_or_else(|| json!([])),
        })
    }
}

/// AI準備度診断の提出リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAiReadinessRequest {
    pub tier: Option<String>,
    /// 業種 (未指定は higher-education)
    pub industry: Option<String>,

    #[validate(length(max = 200, message = "Institution name cannot exceed 200 characters"))]
    pub institution_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    #[validate(length(max = 100, message = "Contact name cannot exceed 100 characters"))]
    pub contact_name: Option<String>,

    pub responses: Option<Value>,
    pub uploaded_files: Option<Value>,
}

impl SubmitAiReadinessRequest {
    pub fn into_submission(self) -> AppResult<NewSubmission> {
        let responses = self
            .responses
            .filter(|r| !r.is_null())
            .ok_or_else(|| AppError::BadRequest("Missing required field: responses".to_string()))?;
        let tier = parse_ai_tier(self.tier.as_deref().unwrap_or_default())?;

        Ok(NewSubmission {
            tier,
            organization_type: present(self.industry)
                .unwrap_or_else(|| DEFAULT_AI_INDUSTRY.to_string()),
            institution_name: present(self.institution_name),
            contact_email: present(self.contact_email),
            contact_name: present(self.contact_name),
            responses,
            uploaded_files: self.uploaded_files.unwrap_or_else(|| json!([])),
        })
    }
}

/// 共同編集者の追加
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCollaboratorRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: Option<String>,
}

impl AddCollaboratorRequest {
    /// 未指定なら COLLABORATOR
    pub fn role(&self) -> AppResult<CollaboratorRole> {
        match self.role.as_deref() {
            None => Ok(CollaboratorRole::Collaborator),
            Some(raw) => raw.parse().map_err(AppError::BadRequest),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveCollaboratorQuery {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    pub content: String,

    #[validate(length(max = 100, message = "Section cannot exceed 100 characters"))]
    pub section: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> SubmitAssessmentRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let err = request(json!({"tier": "one-time-diagnostic", "responses": {}}))
            .into_submission()
            .unwrap_err();
        match err {
            AppError::BadRequest(message) => assert_eq!(message, MISSING_FIELDS),
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(request(json!({"tier": " ", "organizationType": "healthcare", "responses": {}}))
            .into_submission()
            .is_err());
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let result = request(json!({
            "tier": "platinum",
            "organizationType": "healthcare",
            "responses": {"q1": 3}
        }))
        .into_submission();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_submission_defaults() {
        let submission = request(json!({
            "tier": "one-time-diagnostic",
            "organizationType": "higher-education",
            "responses": {"q1": 3},
            "institutionName": "  "
        }))
        .into_submission()
        .unwrap();
        assert_eq!(submission.tier, PricingTier::OneTimeDiagnostic);
        assert_eq!(submission.institution_name, None);
        assert_eq!(submission.uploaded_files, json!([]));
    }

    #[test]
    fn test_ai_submission_requires_ai_tier() {
        let body: SubmitAiReadinessRequest = serde_json::from_value(json!({
            "tier": "one-time-diagnostic",
            "responses": []
        }))
        .unwrap();
        assert!(body.into_submission().is_err());

        let body: SubmitAiReadinessRequest = serde_json::from_value(json!({
            "tier": "higher-ed-ai-pulse-check",
            "responses": []
        }))
        .unwrap();
        let submission = body.into_submission().unwrap();
        assert_eq!(submission.organization_type, "higher-education");
    }

    #[test]
    fn test_comment_length_validation() {
        let empty = CreateCommentRequest {
            content: String::new(),
            section: None,
        };
        assert!(empty.validate().is_err());

        let long = CreateCommentRequest {
            content: "a".repeat(2001),
            section: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_collaborator_role_default() {
        let body = AddCollaboratorRequest {
            email: "peer@example.edu".to_string(),
            role: None,
        };
        assert_eq!(body.role().unwrap(), CollaboratorRole::Collaborator);
        let body = AddCollaboratorRequest {
            email: "peer@example.edu".to_string(),
            role: Some("owner".to_string()),
        };
        assert!(body.role().is_err());
    }
}
