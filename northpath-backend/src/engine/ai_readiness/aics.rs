// northpath-backend/src/engine/ai_readiness/aics.rs

//! AICS (AI Cultural Compatibility Score)

use super::{keyword_score, Level};
use crate::engine::response::{AssessmentResponse, OrganizationProfile};
use serde::{Deserialize, Serialize};

const INNOVATION_WEIGHT: f64 = 0.25;
const COLLABORATION_WEIGHT: f64 = 0.20;
const LEARNING_WEIGHT: f64 = 0.20;
const CHANGE_WEIGHT: f64 = 0.15;
const RISK_WEIGHT: f64 = 0.10;
const TECHNOLOGY_WEIGHT: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    High,
    Moderate,
    Low,
    Critical,
}

impl CompatibilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            CompatibilityLevel::High
        } else if score >= 0.55 {
            CompatibilityLevel::Moderate
        } else if score >= 0.35 {
            CompatibilityLevel::Low
        } else {
            CompatibilityLevel::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalDimensions {
    pub innovation_openness: f64,
    pub collaboration_readiness: f64,
    pub learning_orientation: f64,
    pub change_adaptability: f64,
    pub risk_tolerance: f64,
    pub technology_acceptance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalBarrier {
    pub dimension: String,
    pub barrier: String,
    pub severity: Level,
    pub impact: f64,
    pub mitigation_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalEnabler {
    pub dimension: String,
    pub enabler: String,
    pub strength: f64,
    pub leverage_opportunity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    Critical,
    Important,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRequirement {
    pub area: String,
    pub requirement: String,
    pub priority: RequirementPriority,
    pub timeline: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AicsMetrics {
    pub overall_compatibility: f64,
    pub compatibility_level: CompatibilityLevel,
    pub cultural_dimensions: CulturalDimensions,
    pub cultural_barriers: Vec<CulturalBarrier>,
    pub cultural_enablers: Vec<CulturalEnabler>,
    pub transformation_requirements: Vec<TransformationRequirement>,
    pub faculty_readiness: f64,
    pub student_acceptance: f64,
}

fn dimensions(responses: &[AssessmentResponse]) -> CulturalDimensions {
    CulturalDimensions {
        innovation_openness: keyword_score(
            responses,
            &["innovation", "creativity", "experimentation", "new ideas"],
        ),
        collaboration_readiness: keyword_score(
            responses,
            &["collaboration", "teamwork", "interdisciplinary", "partnership"],
        ),
        learning_orientation: keyword_score(
            responses,
            &["learning", "development", "training", "growth", "continuous improvement"],
        ),
        change_adaptability: keyword_score(
            responses,
            &["change", "adaptation", "flexibility", "agility"],
        ),
        risk_tolerance: keyword_score(
            responses,
            &["risk", "uncertainty", "experimentation", "pilot"],
        ),
        technology_acceptance: keyword_score(
            responses,
            &["technology", "digital", "automation", "systems"],
        ),
    }
}

fn barriers(score: f64) -> Vec<CulturalBarrier> {
    if score >= 0.6 {
        return Vec::new();
    }
    vec![
        CulturalBarrier {
            dimension: "Faculty Autonomy".to_string(),
            barrier: "Strong preference for individual academic freedom over collaborative AI adoption".to_string(),
            severity: Level::High,
            impact: 0.8,
            mitigation_strategy: "Emphasize AI as enhancing rather than replacing faculty expertise".to_string(),
        },
        CulturalBarrier {
            dimension: "Risk Aversion".to_string(),
            barrier: "Conservative institutional culture resistant to technological experimentation".to_string(),
            severity: Level::Medium,
            impact: 0.6,
            mitigation_strategy: "Start with low-risk pilot programs and demonstrate success".to_string(),
        },
    ]
}

fn enablers(score: f64) -> Vec<CulturalEnabler> {
    if score < 0.5 {
        return Vec::new();
    }
    vec![
        CulturalEnabler {
            dimension: "Learning Culture".to_string(),
            enabler: "Strong institutional commitment to continuous learning and improvement"
                .to_string(),
            strength: 0.7,
            leverage_opportunity: "Build on existing professional development programs".to_string(),
        },
        CulturalEnabler {
            dimension: "Student-Centered Focus".to_string(),
            enabler: "Deep commitment to student success and outcomes".to_string(),
            strength: 0.8,
            leverage_opportunity: "Frame AI initiatives around student success benefits"
                .to_string(),
        },
    ]
}

fn transformation_requirements(score: f64) -> Vec<TransformationRequirement> {
    if score >= 0.7 {
        return Vec::new();
    }
    let to_strings =
        |items: [&str; 3]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    vec![
        TransformationRequirement {
            area: "Faculty Development".to_string(),
            requirement: "Comprehensive AI literacy and pedagogical integration training"
                .to_string(),
            priority: RequirementPriority::Critical,
            timeline: "6-12 months".to_string(),
            resources: to_strings(["Training budget", "Expert facilitators", "Release time"]),
        },
        TransformationRequirement {
            area: "Change Management".to_string(),
            requirement: "Structured change management program with stakeholder engagement"
                .to_string(),
            priority: RequirementPriority::Important,
            timeline: "3-9 months".to_string(),
            resources: to_strings([
                "Change management expertise",
                "Communication resources",
                "Leadership time",
            ]),
        },
    ]
}

/// AICS の算出
pub fn calculate_aics(
    responses: &[AssessmentResponse],
    _profile: &OrganizationProfile,
) -> AicsMetrics {
    let d = dimensions(responses);
    let overall = d.innovation_openness * INNOVATION_WEIGHT
        + d.collaboration_readiness * COLLABORATION_WEIGHT
        + d.learning_orientation * LEARNING_WEIGHT
        + d.change_adaptability * CHANGE_WEIGHT
        + d.risk_tolerance * RISK_WEIGHT
        + d.technology_acceptance * TECHNOLOGY_WEIGHT;

    AicsMetrics {
        overall_compatibility: overall,
        compatibility_level: CompatibilityLevel::from_score(overall),
        cultural_dimensions: d,
        cultural_barriers: barriers(overall),
        cultural_enablers: enablers(overall),
        transformation_requirements: transformation_requirements(overall),
        faculty_readiness: keyword_score(
            responses,
            &["faculty", "instructor", "professor", "teaching"],
        ),
        student_acceptance: keyword_score(
            responses,
            &["student", "learner", "academic experience"],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_culture_has_barriers_and_enablers() {
        let metrics = calculate_aics(&[], &OrganizationProfile::default());
        assert!((metrics.overall_compatibility - 0.5).abs() < 1e-9);
        assert_eq!(metrics.compatibility_level, CompatibilityLevel::Low);
        assert_eq!(metrics.cultural_barriers.len(), 2);
        assert_eq!(metrics.cultural_enablers.len(), 2);
        assert_eq!(metrics.transformation_requirements.len(), 2);
        assert_eq!(metrics.faculty_readiness, 0.5);
    }

    #[test]
    fn test_strong_culture_needs_no_transformation() {
        let sections = [
            "Innovation",
            "Collaboration",
            "Learning",
            "Change",
            "Risk",
            "Technology",
        ];
        let responses: Vec<_> = sections
            .iter()
            .map(|s| AssessmentResponse::numeric(s, s, 4.0))
            .collect();
        let metrics = calculate_aics(&responses, &OrganizationProfile::default());

        assert!((metrics.overall_compatibility - 1.0).abs() < 1e-9);
        assert_eq!(metrics.compatibility_level, CompatibilityLevel::High);
        assert!(metrics.cultural_barriers.is_empty());
        assert!(metrics.transformation_requirements.is_empty());
        assert_eq!(metrics.cultural_enablers[1].dimension, "Student-Centered Focus");
    }

    #[test]
    fn test_critical_level_below_threshold() {
        assert_eq!(CompatibilityLevel::from_score(0.2), CompatibilityLevel::Critical);
        assert_eq!(CompatibilityLevel::from_score(0.55), CompatibilityLevel::Moderate);
    }
}
