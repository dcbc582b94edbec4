// northpath-backend/src/engine/ai_readiness/airix.rs

//! AIRIX (AI Readiness Index)

use super::response_score;
use crate::engine::response::{mean_score, AssessmentResponse, OrganizationProfile, ResponseValue};
use crate::engine::stats::population_variance;
use serde::{Deserialize, Serialize};

pub const AIRIX_VERSION: &str = "1.0.0";

const STRATEGIC_WEIGHT: f64 = 0.25;
const INFRASTRUCTURE_WEIGHT: f64 = 0.20;
const CULTURAL_WEIGHT: f64 = 0.20;
const RESOURCE_WEIGHT: f64 = 0.15;
const ETHICS_WEIGHT: f64 = 0.10;
const ALIGNMENT_WEIGHT: f64 = 0.10;

/// 想定設問数 (信頼度の完全性指標に使用)
const EXPECTED_QUESTIONS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessLevel {
    Foundational,
    Developing,
    Intermediate,
    Advanced,
}

impl ReadinessLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ReadinessLevel::Advanced
        } else if score >= 0.70 {
            ReadinessLevel::Intermediate
        } else if score >= 0.50 {
            ReadinessLevel::Developing
        } else {
            ReadinessLevel::Foundational
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessLevel::Foundational => "foundational",
            ReadinessLevel::Developing => "developing",
            ReadinessLevel::Intermediate => "intermediate",
            ReadinessLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainScores {
    pub strategic_readiness: f64,
    pub infrastructure_security: f64,
    pub cultural_readiness: f64,
    pub resource_planning: f64,
    pub ethics_compliance: f64,
    pub mission_alignment: f64,
}

impl DomainScores {
    pub fn weighted_total(&self) -> f64 {
        self.strategic_readiness * STRATEGIC_WEIGHT
            + self.infrastructure_security * INFRASTRUCTURE_WEIGHT
            + self.cultural_readiness * CULTURAL_WEIGHT
            + self.resource_planning * RESOURCE_WEIGHT
            + self.ethics_compliance * ETHICS_WEIGHT
            + self.mission_alignment * ALIGNMENT_WEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessFactor {
    pub domain: String,
    pub factor: String,
    pub impact: Impact,
    pub strength: f64,
    pub description: String,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirixMetrics {
    pub overall_readiness: f64,
    pub readiness_level: ReadinessLevel,
    pub confidence: f64,
    pub domain_scores: DomainScores,
    pub readiness_factors: Vec<ReadinessFactor>,
    pub implementation_capacity: f64,
    pub risk_score: f64,
    pub benchmark_percentile: f64,
    pub recommendations: Vec<String>,
    pub key_insights: Vec<String>,
}

fn in_domain<'a>(
    responses: &'a [AssessmentResponse],
    domain: &'a str,
) -> impl Iterator<Item = &'a AssessmentResponse> + Clone {
    responses
        .iter()
        .filter(move |r| r.domain.as_deref() == Some(domain) || r.section_contains(domain))
}

fn domain_base(responses: &[AssessmentResponse], domain: &str) -> f64 {
    mean_score(in_domain(responses, domain), response_score)
}

fn topic_score<'a, I>(domain_responses: I, topics: &[&str]) -> f64
where
    I: Iterator<Item = &'a AssessmentResponse>,
{
    mean_score(
        domain_responses.filter(|r| topics.iter().any(|t| r.topic_contains(t))),
        response_score,
    )
}

fn domain_scores(responses: &[AssessmentResponse]) -> DomainScores {
    let strategic = in_domain(responses, "strategic");
    let infrastructure = in_domain(responses, "infrastructure");
    let cultural = in_domain(responses, "cultural");
    let ethics = in_domain(responses, "ethics");
    let alignment = in_domain(responses, "alignment");

    DomainScores {
        strategic_readiness: mean_score(strategic.clone(), response_score) * 0.6
            + topic_score(strategic.clone(), &["leadership"]) * 0.25
            + topic_score(strategic, &["governance"]) * 0.15,
        infrastructure_security: mean_score(infrastructure.clone(), response_score) * 0.5
            + topic_score(infrastructure.clone(), &["ferpa", "privacy"]) * 0.3
            + topic_score(infrastructure, &["security"]) * 0.2,
        cultural_readiness: mean_score(cultural.clone(), response_score) * 0.5
            + topic_score(cultural.clone(), &["faculty"]) * 0.3
            + topic_score(cultural, &["change"]) * 0.2,
        resource_planning: domain_base(responses, "resource"),
        ethics_compliance: mean_score(ethics.clone(), response_score) * 0.7
            + topic_score(ethics, &["integrity"]) * 0.3,
        mission_alignment: mean_score(alignment.clone(), response_score) * 0.5
            + topic_score(alignment.clone(), &["strategic"]) * 0.3
            + topic_score(alignment, &["student"]) * 0.2,
    }
}

// 分散が小さいほど一貫性が高い
fn response_consistency(responses: &[AssessmentResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = responses
        .iter()
        .map(|r| match &r.value {
            Some(ResponseValue::Number(v)) => v / 4.0,
            _ => 0.5,
        })
        .collect();
    (1.0 - population_variance(&scores) * 2.0).max(0.0)
}

fn confidence(responses: &[AssessmentResponse], overall: f64) -> f64 {
    let completeness = responses.len() as f64 / EXPECTED_QUESTIONS;
    let data_quality = (completeness + response_consistency(responses)) / 2.0;
    (data_quality * 0.7 + overall * 0.3).min(0.95)
}

fn risk_score(responses: &[AssessmentResponse], overall: f64) -> f64 {
    let cultural_resistance = 1.0 - domain_base(responses, "cultural");
    let compliance_risk = 1.0 - domain_base(responses, "ethics");
    let resource_risk = 1.0 - domain_base(responses, "resource");
    ((1.0 - overall) + (cultural_resistance + compliance_risk + resource_risk) * 0.1).min(1.0)
}

fn benchmark_percentile(overall: f64, profile: &OrganizationProfile) -> f64 {
    let digital_maturity = profile.digital_maturity.unwrap_or(0.5);
    let innovation_capacity = profile.innovation_capacity.unwrap_or(0.5);

    let mut percentile = overall * 100.0;
    if digital_maturity < 0.4 {
        percentile += 10.0;
    } else if innovation_capacity > 0.8 {
        percentile -= 5.0;
    }
    percentile.clamp(1.0, 99.0)
}

fn readiness_factors() -> Vec<ReadinessFactor> {
    let factor = |domain: &str,
                  name: &str,
                  impact: Impact,
                  strength: f64,
                  description: &str,
                  actions: [&str; 3]| ReadinessFactor {
        domain: domain.to_string(),
        factor: name.to_string(),
        impact,
        strength,
        description: description.to_string(),
        action_items: actions.iter().map(|a| a.to_string()).collect(),
    };

    vec![
        factor(
            "Strategic Leadership",
            "Executive Commitment",
            Impact::Positive,
            0.75,
            "Strong executive leadership commitment to AI initiatives",
            [
                "Establish AI steering committee",
                "Define AI strategy roadmap",
                "Allocate strategic resources",
            ],
        ),
        factor(
            "Faculty Engagement",
            "Pedagogical Alignment",
            Impact::Neutral,
            0.55,
            "Moderate faculty comfort with AI integration in teaching",
            [
                "Faculty AI literacy workshops",
                "Pilot AI teaching tools",
                "Create faculty AI community",
            ],
        ),
        factor(
            "Infrastructure",
            "Data Governance",
            Impact::Negative,
            0.35,
            "Limited data governance frameworks for AI compliance",
            [
                "Develop data governance policies",
                "FERPA compliance review",
                "Data security assessment",
            ],
        ),
    ]
}

fn recommendations(overall: f64) -> Vec<String> {
    let set: [&str; 3] = if overall < 0.5 {
        [
            "Establish foundational AI governance structure",
            "Conduct comprehensive faculty AI literacy assessment",
            "Develop institutional AI ethics framework",
        ]
    } else if overall < 0.7 {
        [
            "Launch pilot AI initiatives in low-risk areas",
            "Expand faculty professional development programs",
            "Strengthen data governance and compliance frameworks",
        ]
    } else {
        [
            "Scale successful AI pilots across institution",
            "Develop advanced AI capabilities and partnerships",
            "Establish center of excellence for AI in education",
        ]
    };
    set.iter().map(|s| s.to_string()).collect()
}

fn key_insights(level: ReadinessLevel) -> Vec<String> {
    vec![
        format!("Institution demonstrates {} AI readiness", level.as_str()),
        "Strategic leadership support is critical for AI success".to_string(),
        "Faculty engagement requires dedicated change management".to_string(),
        "Data governance is foundational for responsible AI use".to_string(),
        "Mission alignment ensures sustainable AI adoption".to_string(),
    ]
}

/// AIRIX の算出
pub fn calculate_airix(
    responses: &[AssessmentResponse],
    profile: &OrganizationProfile,
) -> AirixMetrics {
    let domain_scores = domain_scores(responses);
    let overall = domain_scores.weighted_total();
    let level = ReadinessLevel::from_score(overall);

    let implementation_capacity = domain_base(responses, "resource") * 0.4
        + domain_base(responses, "strategic") * 0.3
        + overall * 0.3;

    AirixMetrics {
        overall_readiness: overall,
        readiness_level: level,
        confidence: confidence(responses, overall),
        domain_scores,
        readiness_factors: readiness_factors(),
        implementation_capacity,
        risk_score: risk_score(responses, overall),
        benchmark_percentile: benchmark_percentile(overall, profile),
        recommendations: recommendations(overall),
        key_insights: key_insights(level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain_response(domain: &str, topic: Option<&str>, value: f64) -> AssessmentResponse {
        AssessmentResponse {
            question_id: format!("{domain}-{value}"),
            domain: Some(domain.to_string()),
            topic: topic.map(str::to_string),
            value: Some(ResponseValue::Number(value)),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_responses_is_neutral_across_all_domains() {
        let metrics = calculate_airix(&[], &OrganizationProfile::default());
        // 全6ドメインが 0.5 で寄与する
        assert!((metrics.overall_readiness - 0.5).abs() < 1e-9);
        assert_eq!(metrics.readiness_level, ReadinessLevel::Developing);
        assert_eq!(metrics.benchmark_percentile, 50.0);
        assert_eq!(metrics.key_insights[0], "Institution demonstrates developing AI readiness");
    }

    #[test]
    fn test_every_domain_contributes_to_overall() {
        let domains = ["strategic", "infrastructure", "cultural", "resource", "ethics", "alignment"];
        let responses: Vec<_> = domains.iter().map(|d| domain_response(d, None, 4.0)).collect();
        let metrics = calculate_airix(&responses, &OrganizationProfile::default());

        // base 1.0 と中立のトピック値 0.5 の合成
        let expected = 0.25 * (0.6 + 0.125 + 0.075)
            + 0.20 * (0.5 + 0.15 + 0.1)
            + 0.20 * (0.5 + 0.15 + 0.1)
            + 0.15 * 1.0
            + 0.10 * (0.7 + 0.15)
            + 0.10 * (0.5 + 0.15 + 0.1);
        assert!((metrics.overall_readiness - expected).abs() < 1e-9);
        assert_eq!(metrics.readiness_level, ReadinessLevel::Intermediate);
        assert_eq!(
            metrics.recommendations[0],
            "Scale successful AI pilots across institution"
        );
    }

    #[test]
    fn test_topic_weighting_within_domain() {
        let responses = vec![
            domain_response("strategic", Some("leadership"), 4.0),
            domain_response("strategic", Some("governance"), 0.0),
        ];
        let metrics = calculate_airix(&responses, &OrganizationProfile::default());
        // base .5, leadership 1.0, governance 0
        assert!((metrics.domain_scores.strategic_readiness - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_section_selects_domain() {
        let response = AssessmentResponse::numeric("q1", "Resource Planning", 0.0);
        let metrics = calculate_airix(&[response], &OrganizationProfile::default());
        assert_eq!(metrics.domain_scores.resource_planning, 0.0);

        let unrelated = AssessmentResponse::numeric("q1", "Budget", 0.0);
        let metrics = calculate_airix(&[unrelated], &OrganizationProfile::default());
        assert_eq!(metrics.domain_scores.resource_planning, 0.5);
    }

    #[test]
    fn test_percentile_adjustments() {
        let low_maturity = OrganizationProfile {
            digital_maturity: Some(0.2),
            ..Default::default()
        };
        assert_eq!(benchmark_percentile(0.5, &low_maturity), 60.0);

        let innovative = OrganizationProfile {
            innovation_capacity: Some(0.9),
            ..Default::default()
        };
        assert_eq!(benchmark_percentile(0.5, &innovative), 45.0);
        assert_eq!(benchmark_percentile(1.2, &innovative), 99.0);
    }

    #[test]
    fn test_confidence_is_capped() {
        let responses: Vec<_> = (0..120)
            .map(|_| domain_response("strategic", None, 4.0))
            .collect();
        let metrics = calculate_airix(&responses, &OrganizationProfile::default());
        assert_eq!(metrics.confidence, 0.95);
    }
}
