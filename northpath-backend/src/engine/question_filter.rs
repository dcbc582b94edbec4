// northpath-backend/src/engine/question_filter.rs

//! ティアに応じた設問の選択

use crate::domain::pricing_tier::{industry_sections, PricingTier};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static QUESTION_BANK_JSON: &str = include_str!("../../data/question_bank.json");

/// 組み込みの設問バンク。起動時に一度だけパースする
pub static QUESTION_BANK: Lazy<QuestionBank> = Lazy::new(|| {
    serde_json::from_str(QUESTION_BANK_JSON).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to parse embedded question bank");
        QuestionBank::default()
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Likert,
    MultipleChoice,
    OpenEnded,
    FileUpload,
    Matrix,
    Ranking,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTier {
    PulseCheck,
    Comprehensive,
    Transformation,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPriority {
    Essential,
    High,
    Medium,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub domain: String,
    pub section: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub tier: QuestionTier,
    pub priority: QuestionPriority,
    #[serde(default)]
    pub required: bool,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBank {
    pub likert_scale: Vec<QuestionOption>,
    pub ai_readiness: Vec<Question>,
    pub organizational: Vec<Question>,
}

/// AI ティアごとの設問構成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQuestionFilter {
    pub question_count: usize,
    pub include_document_uploads: bool,
    pub max_document_uploads: usize,
    pub max_open_ended: usize,
    pub include_scenarios: bool,
    pub include_partnership_planning: bool,
}

pub fn ai_filter(tier: PricingTier) -> Option<AiQuestionFilter> {
    let filter = match tier {
        PricingTier::HigherEdAiPulseCheck => AiQuestionFilter {
            question_count: 50,
            include_document_uploads: false,
            max_document_uploads: 0,
            max_open_ended: 10,
            include_scenarios: false,
            include_partnership_planning: false,
        },
        PricingTier::AiReadinessComprehensive => AiQuestionFilter {
            question_count: 105,
            include_document_uploads: true,
            max_document_uploads: 5,
            max_open_ended: 25,
            include_scenarios: false,
            include_partnership_planning: false,
        },
        PricingTier::AiTransformationBlueprint => AiQuestionFilter {
            question_count: 150,
            include_document_uploads: true,
            max_document_uploads: 10,
            max_open_ended: 40,
            include_scenarios: true,
            include_partnership_planning: false,
        },
        PricingTier::AiEnterprisePartnership => AiQuestionFilter {
            question_count: 200,
            include_document_uploads: true,
            max_document_uploads: 20,
            max_open_ended: 60,
            include_scenarios: true,
            include_partnership_planning: true,
        },
        _ => return None,
    };
    Some(filter)
}

fn allowed_levels(tier: PricingTier) -> &'static [QuestionTier] {
    match tier {
        PricingTier::HigherEdAiPulseCheck => &[QuestionTier::PulseCheck],
        PricingTier::AiReadinessComprehensive => {
            &[QuestionTier::PulseCheck, QuestionTier::Comprehensive]
        }
        PricingTier::AiTransformationBlueprint => &[
            QuestionTier::PulseCheck,
            QuestionTier::Comprehensive,
            QuestionTier::Transformation,
        ],
        _ => &[
            QuestionTier::PulseCheck,
            QuestionTier::Comprehensive,
            QuestionTier::Transformation,
            QuestionTier::Enterprise,
        ],
    }
}

fn select_ai<'a>(tier: PricingTier, bank: &'a [Question], target: usize) -> Vec<&'a Question> {
    if tier == PricingTier::HigherEdAiPulseCheck {
        let pulse: Vec<&Question> = bank
            .iter()
            .filter(|q| q.tier == QuestionTier::PulseCheck)
            .collect();
        let rank = |q: &Question| match q.priority {
            QuestionPriority::Essential => 0,
            QuestionPriority::High => 1,
            _ => 2,
        };

        // 安定ソートなので同じ優先度内では元の順序を保つ
        let mut selected = pulse;
        selected.sort_by_key(|q| rank(q));
        selected.truncate(target);
        return selected;
    }

    // 下位レベルの設問から順に詰める
    let mut selected = Vec::with_capacity(target);
    for level in allowed_levels(tier) {
        selected.extend(bank.iter().filter(|q| q.tier == *level));
    }
    selected.truncate(target);
    selected
}

fn select_organizational<'a>(
    tier: PricingTier,
    industry: Option<&str>,
    bank: &'a [Question],
    target: usize,
) -> Vec<&'a Question> {
    let sections = tier.config().assessment_scope.sections;
    let extra = industry
        .map(|i| industry_sections(i, tier))
        .unwrap_or_default();

    let core: Vec<&Question> = bank
        .iter()
        .filter(|q| sections.contains(&q.section.as_str()))
        .collect();
    let specialized: Vec<&Question> = bank
        .iter()
        .filter(|q| extra.contains(&q.section.as_str()))
        .collect();

    // 業種設問は全体の3割まで先に枠を確保する
    let reserved = specialized.len().min((target as f64 * 0.3).floor() as usize);
    let mut selected: Vec<&Question> = core
        .iter()
        .copied()
        .take(target.saturating_sub(reserved))
        .collect();
    selected.extend(specialized);
    selected.truncate(target);
    selected
}

/// ティアと業種に応じた設問一覧
pub fn questions_for_tier<'a>(
    bank: &'a QuestionBank,
    tier: PricingTier,
    industry: Option<&str>,
) -> Vec<&'a Question> {
    let target = tier.config().assessment_scope.question_count as usize;
    if tier.is_ai_tier() {
        select_ai(tier, &bank.ai_readiness, target)
    } else {
        select_organizational(tier, industry, &bank.organizational, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDistribution {
    pub total: usize,
    pub document_uploads: usize,
    pub open_ended: usize,
    pub scenarios: usize,
    pub partnership_planning: usize,
}

pub fn type_distribution(tier: PricingTier) -> TypeDistribution {
    match ai_filter(tier) {
        Some(filter) => TypeDistribution {
            total: filter.question_count,
            document_uploads: if filter.include_document_uploads {
                filter.max_document_uploads
            } else {
                0
            },
            open_ended: filter.max_open_ended,
            scenarios: if filter.include_scenarios { 3 } else { 0 },
            partnership_planning: if filter.include_partnership_planning {
                2
            } else {
                0
            },
        },
        None => TypeDistribution {
            total: tier.config().assessment_scope.question_count as usize,
            document_uploads: 0,
            open_ended: 0,
            scenarios: 0,
            partnership_planning: 0,
        },
    }
}

pub fn validate_question_count(tier: PricingTier, count: usize) -> bool {
    count == tier.config().assessment_scope.question_count as usize
}
