// northpath-backend/src/engine/dsch.rs

//! DSCH (Dynamic Structural Complexity Heuristic) v2.1
//!
//! 構造・業務・文化・戦略の4次元を、それぞれ4因子の加重平均で評価する。

use super::response::{mean_score, AssessmentResponse, OrganizationProfile, ResponseValue};
use serde::{Deserialize, Serialize};

pub const DSCH_VERSION: &str = "2.1.0";

const STRUCTURAL_WEIGHT: f64 = 0.35;
const OPERATIONAL_WEIGHT: f64 = 0.25;
const CULTURAL_WEIGHT: f64 = 0.20;
const STRATEGIC_WEIGHT: f64 = 0.20;

const LOW_COMPLEXITY: f64 = 0.3;
const MEDIUM_COMPLEXITY: f64 = 0.6;

const FACTOR_WEIGHTS: [f64; 4] = [0.3, 0.25, 0.25, 0.2];

const STRUCTURAL_FACTORS: [&[&str]; 4] = [
    &["hierarchy", "reporting", "levels", "structure"],
    &["decision", "authority", "approval"],
    &["report", "supervisor", "manager", "reporting", "structure"],
    &["communication", "information", "meeting", "feedback"],
];
const OPERATIONAL_FACTORS: [&[&str]; 4] = [
    &["process", "workflow", "efficiency", "procedures"],
    &["resource", "budget", "staff", "allocation"],
    &["technology", "system", "digital", "integration"],
    &["performance", "metric", "measurement", "kpi"],
];
const CULTURAL_FACTORS: [&[&str]; 4] = [
    &["value", "mission", "culture", "vision"],
    &["collaboration", "teamwork", "cooperation"],
    &["change", "adapt", "flexibility"],
    &["leadership", "leader", "management"],
];
const STRATEGIC_FACTORS: [&[&str]; 4] = [
    &["strategy", "planning", "vision"],
    &["goal", "objective", "target"],
    &["adapt", "flexible", "agile"],
    &["innovation", "creative", "new"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Structural,
    Operational,
    Cultural,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: RiskCategory,
    pub severity: Severity,
    pub description: String,
    pub impact: f64,
    pub mitigation: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationPriority {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "expectedROI")]
    pub expected_roi: f64,
    pub timeframe: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInstitution {
    pub name: String,
    pub score: f64,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkData {
    pub industry_average: f64,
    pub top_quartile: f64,
    pub percentile_rank: f64,
    pub similar_institutions: Vec<PeerInstitution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DschMetrics {
    pub structural_complexity: f64,
    pub operational_efficiency: f64,
    pub cultural_alignment: f64,
    pub strategic_readiness: f64,
    pub overall_score: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<Recommendation>,
    pub benchmark_comparison: BenchmarkData,
}

fn matches_any(response: &AssessmentResponse, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| {
        response.question_contains(k) || response.tag_contains(k) || response.section_contains(k)
    })
}

/// 1件の回答を 0-1 に換算 (数値は 5 段階を想定)
pub fn response_score(response: &AssessmentResponse) -> f64 {
    match &response.value {
        Some(ResponseValue::Number(v)) => v / 5.0,
        Some(ResponseValue::Text(text)) => {
            let value = text.to_lowercase();
            // "very poor" は "poor" より先に判定する
            if value.contains("very poor") {
                0.2
            } else if value.contains("excellent") || value.contains("very good") {
                1.0
            } else if value.contains("good") {
                0.8
            } else if value.contains("fair") || value.contains("average") {
                0.6
            } else if value.contains("poor") {
                0.4
            } else {
                0.5
            }
        }
        None => 0.5,
    }
}

fn factor_score(responses: &[AssessmentResponse], keywords: &[&str]) -> f64 {
    mean_score(
        responses.iter().filter(|r| matches_any(r, keywords)),
        response_score,
    )
}

fn dimension_score(responses: &[AssessmentResponse], factors: &[&[&str]; 4]) -> f64 {
    let weighted: f64 = factors
        .iter()
        .zip(FACTOR_WEIGHTS)
        .map(|(keywords, w)| factor_score(responses, keywords) * w)
        .sum();
    weighted / FACTOR_WEIGHTS.iter().sum::<f64>()
}

fn identify_risk_factors(overall: f64) -> Vec<RiskFactor> {
    if overall >= LOW_COMPLEXITY {
        return Vec::new();
    }
    vec![RiskFactor {
        category: RiskCategory::Structural,
        severity: Severity::High,
        description:
            "Low organizational complexity score indicates potential structural inefficiencies"
                .to_string(),
        impact: 0.8,
        mitigation: vec![
            "Conduct detailed structural analysis".to_string(),
            "Implement process optimization".to_string(),
            "Review organizational design".to_string(),
        ],
    }]
}

fn generate_recommendations(overall: f64) -> Vec<Recommendation> {
    if overall >= MEDIUM_COMPLEXITY {
        return Vec::new();
    }
    vec![Recommendation {
        priority: RecommendationPriority::Immediate,
        category: "Structural Optimization".to_string(),
        title: "Organizational Structure Review".to_string(),
        description: "Conduct comprehensive review of organizational structure to identify optimization opportunities".to_string(),
        expected_roi: 0.15,
        timeframe: "3-6 months".to_string(),
        resources: vec![
            "Senior Leadership".to_string(),
            "HR Team".to_string(),
            "External Consultant".to_string(),
        ],
    }]
}

fn benchmarks(overall: f64) -> BenchmarkData {
    let peer = |name: &str, score: f64, size: &str| PeerInstitution {
        name: name.to_string(),
        score,
        size: size.to_string(),
    };
    BenchmarkData {
        industry_average: 0.65,
        top_quartile: 0.85,
        percentile_rank: (overall * 100.0).clamp(0.0, 100.0),
        similar_institutions: vec![
            peer("Benchmark Institution A", 0.72, "Large"),
            peer("Benchmark Institution B", 0.68, "Medium"),
            peer("Benchmark Institution C", 0.74, "Large"),
        ],
    }
}

/// DSCH の算出
pub fn calculate(responses: &[AssessmentResponse], _profile: &OrganizationProfile) -> DschMetrics {
    let structural_complexity = dimension_score(responses, &STRUCTURAL_FACTORS);
    let operational_efficiency = dimension_score(responses, &OPERATIONAL_FACTORS);
    let cultural_alignment = dimension_score(responses, &CULTURAL_FACTORS);
    let strategic_readiness = dimension_score(responses, &STRATEGIC_FACTORS);

    let overall_score = structural_complexity * STRUCTURAL_WEIGHT
        + operational_efficiency * OPERATIONAL_WEIGHT
        + cultural_alignment * CULTURAL_WEIGHT
        + strategic_readiness * STRATEGIC_WEIGHT;

    DschMetrics {
        structural_complexity,
        operational_efficiency,
        cultural_alignment,
        strategic_readiness,
        overall_score,
        risk_factors: identify_risk_factors(overall_score),
        recommendations: generate_recommendations(overall_score),
        benchmark_comparison: benchmarks(overall_score),
    }
}
