// northpath-backend/src/engine/ai_readiness/airs.rs

//! AIRS (AI Implementation Risk Score)

use super::{keyword_score, Level, Priority};
use crate::engine::response::{AssessmentResponse, OrganizationProfile};
use serde::{Deserialize, Serialize};

const CULTURAL_WEIGHT: f64 = 0.25;
const COMPLIANCE_WEIGHT: f64 = 0.20;
const RESOURCE_WEIGHT: f64 = 0.20;
const TECHNICAL_WEIGHT: f64 = 0.15;
const GOVERNANCE_WEIGHT: f64 = 0.10;
const EXTERNAL_WEIGHT: f64 = 0.10;

// 教員の自律性 (0.2) と学問の自由 (0.15) に由来する固定リスク
const FACULTY_AUTONOMY_RISK: f64 = 0.2;
const ACADEMIC_FREEDOM_RISK: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            RiskLevel::Critical
        } else if score >= 0.70 {
            RiskLevel::High
        } else if score >= 0.50 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub cultural_resistance: f64,
    pub compliance_gaps: f64,
    pub resource_constraints: f64,
    pub technical_limitations: f64,
    pub governance_weaknesses: f64,
    pub external_pressures: f64,
}

impl RiskFactors {
    fn weighted_total(&self) -> f64 {
        self.cultural_resistance * CULTURAL_WEIGHT
            + self.compliance_gaps * COMPLIANCE_WEIGHT
            + self.resource_constraints * RESOURCE_WEIGHT
            + self.technical_limitations * TECHNICAL_WEIGHT
            + self.governance_weaknesses * GOVERNANCE_WEIGHT
            + self.external_pressures * EXTERNAL_WEIGHT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationStrategy {
    pub risk_category: String,
    pub strategy: String,
    pub priority: Priority,
    pub effort: Level,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTimelineItem {
    pub phase: String,
    pub risks: Vec<String>,
    pub mitigations: Vec<String>,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirsMetrics {
    pub overall_risk: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: RiskFactors,
    pub mitigation_strategies: Vec<MitigationStrategy>,
    pub implementation_readiness: f64,
    pub risk_timeline: Vec<RiskTimelineItem>,
}

fn external_risk(profile: &OrganizationProfile) -> f64 {
    let adjustment = match profile.institution_type.as_deref() {
        Some("community_college") => 0.1,
        Some("research_university") => 0.05,
        _ => 0.0,
    };
    (0.3_f64 + adjustment).min(1.0)
}

fn risk_factors(responses: &[AssessmentResponse], profile: &OrganizationProfile) -> RiskFactors {
    let cultural = keyword_score(
        responses,
        &["faculty", "culture", "resistance", "change", "pedagogy"],
    );
    RiskFactors {
        cultural_resistance: (1.0 - cultural
            + (FACULTY_AUTONOMY_RISK + ACADEMIC_FREEDOM_RISK) * 0.1)
            .min(1.0),
        compliance_gaps: 1.0
            - keyword_score(
                responses,
                &["compliance", "ferpa", "privacy", "accessibility", "accreditation"],
            ),
        resource_constraints: 1.0
            - keyword_score(
                responses,
                &["budget", "resources", "staffing", "infrastructure", "funding"],
            ),
        technical_limitations: 1.0
            - keyword_score(
                responses,
                &["technology", "infrastructure", "integration", "systems"],
            ),
        governance_weaknesses: 1.0
            - keyword_score(responses, &["governance", "leadership", "decision", "oversight"]),
        external_pressures: external_risk(profile),
    }
}

fn mitigation_strategies(overall: f64) -> Vec<MitigationStrategy> {
    let strategy = |category: &str, text: &str, priority, effort, impact| MitigationStrategy {
        risk_category: category.to_string(),
        strategy: text.to_string(),
        priority,
        effort,
        impact,
    };

    let mut strategies = Vec::with_capacity(3);
    if overall >= 0.7 {
        strategies.push(strategy(
            "Cultural Resistance",
            "Comprehensive change management program with faculty champions",
            Priority::Immediate,
            Level::High,
            0.8,
        ));
    }
    strategies.push(strategy(
        "Compliance",
        "FERPA and accessibility compliance audit",
        Priority::ShortTerm,
        Level::Medium,
        0.7,
    ));
    strategies.push(strategy(
        "Resource Planning",
        "Phased implementation with quick wins",
        Priority::ShortTerm,
        Level::Medium,
        0.6,
    ));
    strategies
}

fn risk_timeline() -> Vec<RiskTimelineItem> {
    let item = |phase: &str, risks: [&str; 2], mitigations: [&str; 2], timeline: &str| {
        RiskTimelineItem {
            phase: phase.to_string(),
            risks: risks.iter().map(|s| s.to_string()).collect(),
            mitigations: mitigations.iter().map(|s| s.to_string()).collect(),
            timeline: timeline.to_string(),
        }
    };

    vec![
        item(
            "Planning (Months 1-3)",
            ["Incomplete stakeholder buy-in", "Unclear governance structure"],
            ["Stakeholder engagement plan", "Governance framework development"],
            "90 days",
        ),
        item(
            "Pilot Implementation (Months 4-9)",
            ["Faculty resistance", "Technical integration issues"],
            ["Change management support", "Technical pilot testing"],
            "6 months",
        ),
        item(
            "Scale & Adoption (Months 10-18)",
            ["Scaling challenges", "Compliance gaps"],
            ["Systematic rollout plan", "Compliance monitoring"],
            "9 months",
        ),
    ]
}

/// AIRS の算出
pub fn calculate_airs(
    responses: &[AssessmentResponse],
    profile: &OrganizationProfile,
) -> AirsMetrics {
    let factors = risk_factors(responses, profile);
    let overall = factors.weighted_total();

    AirsMetrics {
        overall_risk: overall,
        risk_level: RiskLevel::from_score(overall),
        risk_factors: factors,
        mitigation_strategies: mitigation_strategies(overall),
        implementation_readiness: 1.0 - overall,
        risk_timeline: risk_timeline(),
    }
}
