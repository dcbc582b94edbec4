// northpath-backend/src/api/dto/tier_dto.rs

use crate::domain::pricing_tier::{
    industry_sections, OrgChartCapabilities, PricingTier, TierAlgorithms, TierConfiguration,
    TierUsage, UsageValidation,
};
use crate::engine::question_filter::{
    type_distribution, Question, QuestionOption, TypeDistribution,
};
use crate::error::{AppError, AppResult};
use crate::service::subscription_service::AccessCheck;
use serde::{Deserialize, Serialize};

/// パスやクエリのティア名を解釈する (不正なら 400)
pub fn parse_tier(raw: &str) -> AppResult<PricingTier> {
    raw.parse::<PricingTier>().map_err(AppError::BadRequest)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    pub key: PricingTier,
    pub assessment_type: &'static str,
    #[serde(flatten)]
    pub config: &'static TierConfiguration,
}

impl From<PricingTier> for TierSummary {
    fn from(tier: PricingTier) -> Self {
        Self {
            key: tier,
            assessment_type: tier.assessment_type(),
            config: tier.config(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDetail {
    #[serde(flatten)]
    pub summary: TierSummary,
    pub available_algorithms: Vec<&'static str>,
    pub algorithms: &'static TierAlgorithms,
    pub org_chart: OrgChartCapabilities,
    pub question_types: TypeDistribution,
}

impl From<PricingTier> for TierDetail {
    fn from(tier: PricingTier) -> Self {
        Self {
            summary: TierSummary::from(tier),
            available_algorithms: tier.available_algorithms(),
            algorithms: tier.algorithms(),
            org_chart: tier.org_chart_capabilities(),
            question_types: type_distribution(tier),
        }
    }
}

/// 利用状況と上位ティアの確認
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessRequest {
    #[serde(default)]
    pub usage: TierUsage,
    /// AIティアの階層チェック対象
    pub required_tier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAccessResponse {
    pub tier: PricingTier,
    pub access: AccessCheck,
    pub usage: UsageValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_required_tier_access: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsQuery {
    pub tier: String,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub tier: PricingTier,
    pub industry: Option<String>,
    pub total: usize,
    pub industry_sections: Vec<&'static str>,
    pub likert_scale: &'static [QuestionOption],
    pub distribution: TypeDistribution,
    pub questions: Vec<&'static Question>,
}

impl QuestionSet {
    pub fn new(
        tier: PricingTier,
        industry: Option<String>,
        likert_scale: &'static [QuestionOption],
        questions: Vec<&'static Question>,
    ) -> Self {
        let industry_sections = match (&industry, tier.is_ai_tier()) {
            (Some(industry), false) => industry_sections(industry, tier),
            _ => Vec::new(),
        };
        Self {
            tier,
            total: questions.len(),
            industry_sections,
            likert_scale,
            distribution: type_distribution(tier),
            industry,
            questions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierQuery {
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionStatusQuery {
    pub tier: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tier() {
        assert_eq!(
            parse_tier("comprehensive-package").unwrap(),
            PricingTier::ComprehensivePackage
        );
        assert!(matches!(parse_tier("gold"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_tier_summary_flattens_config() {
        let value = serde_json::to_value(TierSummary::from(PricingTier::OneTimeDiagnostic)).unwrap();
        assert_eq!(value["key"], "one-time-diagnostic");
        assert_eq!(value["assessmentType"], "organizational");
        assert_eq!(value["assessmentScope"]["questionCount"], 50);
    }

    #[test]
    fn test_tier_detail_lists_algorithms() {
        let detail = TierDetail::from(PricingTier::HigherEdAiPulseCheck);
        assert_eq!(detail.available_algorithms, vec!["AIRIX"]);
        assert_eq!(detail.question_types.total, 50);
    }
}
