// northpath-backend/src/service/assessment_service.rs

use crate::db::DbPool;
use crate::domain::assessment_collaborator_model::Model as Collaborator;
use crate::domain::assessment_comment_model::Model as Comment;
use crate::domain::assessment_model::{ActiveModel as AssessmentActiveModel, Model as Assessment};
use crate::domain::assessment_status::AssessmentStatus;
use crate::domain::pricing_tier::PricingTier;
use crate::engine::ai_readiness::AirixMetrics;
use crate::error::{AppError, AppResult};
use crate::repository::assessment_collaborator_repository::AssessmentCollaboratorRepository;
use crate::repository::assessment_comment_repository::AssessmentCommentRepository;
use crate::repository::assessment_repository::AssessmentRepository;
use crate::service::analysis_service::{run_tier_analysis, TierAnalysis};
use crate::service::subscription_service::SubscriptionService;
use crate::utils::email::{EmailService, SubmissionSummary};
use crate::utils::validation::mask_email;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::{ActiveModelBehavior, Set};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const ANONYMOUS_INSTITUTION: &str = "Anonymous Institution";

/// 提出者 (未ログインなら None)
#[derive(Debug, Clone)]
pub struct Submitter {
    pub user_id: Uuid,
    pub email: String,
}

/// 検証済みの提出内容
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub tier: PricingTier,
    pub organization_type: String,
    pub institution_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_name: Option<String>,
    pub responses: Value,
    pub uploaded_files: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub assessment_id: Uuid,
    pub session_id: String,
    pub message: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialAiResults {
    pub ai_readiness_index: f64,
    pub readiness_level: Value,
    pub domain_scores: Value,
    pub recommendation_count: usize,
}

impl From<&AirixMetrics> for InitialAiResults {
    fn from(metrics: &AirixMetrics) -> Self {
        Self {
            ai_readiness_index: metrics.overall_readiness,
            readiness_level: json!(metrics.readiness_level),
            domain_scores: json!(metrics.domain_scores),
            recommendation_count: metrics.recommendations.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSubmissionReceipt {
    pub id: Uuid,
    pub tier: PricingTier,
    pub assessment_type: &'static str,
    pub message: String,
    pub initial_results: Option<InitialAiResults>,
}

/// 管理者向けの詳細
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub collaborators: Vec<Collaborator>,
    pub comments: Vec<Comment>,
}

/// `assessment_{millis}_{9桁の英数字}`
pub fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("assessment_{}_{}", Utc::now().timestamp_millis(), suffix)
}

pub fn results_redirect(session_id: &str, tier: PricingTier, organization_type: &str) -> String {
    format!(
        "/assessment/results?sessionId={}&tier={}&orgType={}",
        session_id, tier, organization_type
    )
}

/// AIティア以外を拒否する
pub fn parse_ai_tier(raw: &str) -> AppResult<PricingTier> {
    match raw.parse::<PricingTier>() {
        Ok(tier) if tier.is_ai_tier() => Ok(tier),
        _ => {
            let valid: Vec<&str> = PricingTier::all()
                .into_iter()
                .filter(PricingTier::is_ai_tier)
                .map(|t| t.as_str())
                .collect();
            Err(AppError::BadRequest(format!(
                "Invalid AI readiness tier: {}. Valid tiers: {}",
                raw,
                valid.join(", ")
            )))
        }
    }
}

pub struct AssessmentService {
    assessment_repo: AssessmentRepository,
    collaborator_repo: AssessmentCollaboratorRepository,
    comment_repo: AssessmentCommentRepository,
    subscription_service: Arc<SubscriptionService>,
    email_service: Arc<EmailService>,
    admin_email: String,
}

impl AssessmentService {
    pub fn new(
        db: DbPool,
        subscription_service: Arc<SubscriptionService>,
        email_service: Arc<EmailService>,
        admin_email: &str,
    ) -> Self {
        Self {
            assessment_repo: AssessmentRepository::new(db.clone()),
            collaborator_repo: AssessmentCollaboratorRepository::new(db.clone()),
            comment_repo: AssessmentCommentRepository::new(db),
            subscription_service,
            email_service,
            admin_email: admin_email.to_string(),
        }
    }

    /// 継続課金ティアは契約が有効なときだけ提出を受け付ける
    async fn ensure_subscription(&self, submitter: &Submitter, tier: PricingTier) -> AppResult<()> {
        if !tier.is_subscription() {
            return Ok(());
        }
        let check = self
            .subscription_service
            .check_access(submitter.user_id, tier)
            .await?;
        if check.is_allowed() {
            return Ok(());
        }

        warn!(
            user_id = %submitter.user_id,
            tier = %tier,
            reason = ?check.reason,
            "Submission blocked by subscription status"
        );
        Err(AppError::SubscriptionRequired {
            tier: tier.as_str().to_string(),
            reason: check
                .reason
                .unwrap_or_else(|| "Subscription required".to_string()),
            requires_upgrade: check.upgrade_required.unwrap_or(true),
        })
    }

    async fn store(
        &self,
        submission: &NewSubmission,
        submitter: Option<&Submitter>,
    ) -> AppResult<(Assessment, TierAnalysis)> {
        let analysis = run_tier_analysis(
            submission.tier,
            &submission.organization_type,
            &submission.responses,
        );
        let contact_email = submission
            .contact_email
            .clone()
            .or_else(|| submitter.map(|s| s.email.clone()));

        let mut model = AssessmentActiveModel::new();
        model.user_id = Set(submitter.map(|s| s.user_id));
        model.tier = Set(submission.tier.as_str().to_string());
        model.assessment_type = Set(submission.tier.assessment_type().to_string());
        model.organization_type = Set(submission.organization_type.clone());
        model.institution_name = Set(Some(
            submission
                .institution_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_INSTITUTION.to_string()),
        ));
        model.contact_email = Set(contact_email);
        model.contact_name = Set(submission.contact_name.clone());
        model.responses = Set(submission.responses.clone());
        model.uploaded_files = Set(submission.uploaded_files.clone());
        model.status = Set(AssessmentStatus::Completed.as_str().to_string());
        model.analysis_results = Set(Some(json!({
            "results": analysis.results,
            "algorithmsRun": analysis.algorithms_run,
            "analyzedAt": Utc::now(),
        })));
        model.ai_readiness_score = Set(analysis.ai_readiness_score);
        model.submitted_at = Set(Some(Utc::now()));

        let assessment = self.assessment_repo.create(model).await?;
        info!(
            assessment_id = %assessment.id,
            tier = %submission.tier,
            algorithms = ?analysis.algorithms_run,
            "Assessment stored"
        );
        Ok((assessment, analysis))
    }

    /// 通知メール。失敗してもログのみ
    async fn send_notifications(&self, assessment: &Assessment) {
        let tier_name = assessment
            .pricing_tier()
            .map_or(assessment.tier.as_str(), |t| t.config().name);
        let assessment_id = assessment.id.to_string();
        let institution = assessment
            .institution_name
            .as_deref()
            .unwrap_or(ANONYMOUS_INSTITUTION);
        let contact_name = assessment.contact_name.as_deref().unwrap_or("Valued Client");
        let contact_email = assessment.contact_email.as_deref().unwrap_or("");

        let summary = SubmissionSummary {
            assessment_id: &assessment_id,
            institution_name: institution,
            organization_type: &assessment.organization_type,
            tier: &assessment.tier,
            tier_name,
            contact_name,
            contact_email,
            response_count: assessment.response_count(),
        };
        if let Err(e) = self
            .email_service
            .send_admin_submission_notice(&self.admin_email, &summary)
            .await
        {
            warn!(assessment_id = %assessment.id, error = %e, "Failed to send admin notice");
        }

        if contact_email.is_empty() {
            return;
        }
        if let Err(e) = self
            .email_service
            .send_assessment_confirmation(
                contact_email,
                contact_name,
                institution,
                tier_name,
                &assessment_id,
            )
            .await
        {
            warn!(
                assessment_id = %assessment.id,
                to_email = %mask_email(contact_email),
                error = %e,
                "Failed to send confirmation email"
            );
        }
    }

    /// 組織診断の提出
    pub async fn submit(
        &self,
        submission: NewSubmission,
        submitter: Option<Submitter>,
    ) -> AppResult<SubmissionReceipt> {
        if let Some(submitter) = &submitter {
            self.ensure_subscription(submitter, submission.tier).await?;
        }

        let (assessment, _) = self.store(&submission, submitter.as_ref()).await?;
        self.send_notifications(&assessment).await;

        let session_id = generate_session_id();
        Ok(SubmissionReceipt {
            assessment_id: assessment.id,
            redirect_url: results_redirect(
                &session_id,
                submission.tier,
                &submission.organization_type,
            ),
            session_id,
            message: "Assessment submitted successfully".to_string(),
        })
    }

    /// AI準備度診断の提出
    pub async fn submit_ai_readiness(
        &self,
        submission: NewSubmission,
        submitter: Option<Submitter>,
    ) -> AppResult<AiSubmissionReceipt> {
        let tier = parse_ai_tier(submission.tier.as_str())?;
        let (assessment, analysis) = self.store(&submission, submitter.as_ref()).await?;
        self.send_notifications(&assessment).await;

        Ok(AiSubmissionReceipt {
            id: assessment.id,
            tier,
            assessment_type: tier.assessment_type(),
            message: "AI readiness assessment submitted successfully".to_string(),
            initial_results: analysis.airix.as_ref().map(InitialAiResults::from),
        })
    }

    /// 自分の診断一覧 (新しい順)
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        email: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Assessment>, u64)> {
        self.assessment_repo
            .find_for_user_paginated(user_id, email, page, per_page)
            .await
    }

    pub async fn find_or_404(&self, id: Uuid) -> AppResult<Assessment> {
        self.assessment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))
    }

    /// 所有者・共同作業者・管理者のみ参照できる
    pub async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        email: &str,
        is_admin: bool,
    ) -> AppResult<Assessment> {
        let assessment = self.find_or_404(id).await?;
        if is_admin || assessment.is_owned_by(user_id, email) {
            return Ok(assessment);
        }
        if self
            .collaborator_repo
            .find_by_email(id, email)
            .await?
            .is_some()
        {
            return Ok(assessment);
        }
        Err(AppError::Forbidden("Access denied".to_string()))
    }

    pub async fn admin_detail(&self, id: Uuid) -> AppResult<AssessmentDetail> {
        let assessment = self.find_or_404(id).await?;
        let collaborators = self.collaborator_repo.find_by_assessment(id).await?;
        let comments = self.comment_repo.find_by_assessment(id).await?;
        Ok(AssessmentDetail {
            assessment,
            collaborators,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "assessment");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_results_redirect() {
        assert_eq!(
            results_redirect("assessment_1_abc", PricingTier::OneTimeDiagnostic, "healthcare"),
            "/assessment/results?sessionId=assessment_1_abc&tier=one-time-diagnostic&orgType=healthcare"
        );
    }

    #[test]
    fn test_parse_ai_tier() {
        assert_eq!(
            parse_ai_tier("ai-readiness-comprehensive").unwrap(),
            PricingTier::AiReadinessComprehensive
        );

        let err = parse_ai_tier("monthly-subscription").unwrap_err();
        match err {
            AppError::BadRequest(message) => {
                assert!(message.starts_with("Invalid AI readiness tier: monthly-subscription"));
                assert!(message.contains("higher-ed-ai-pulse-check"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
