// northpath-backend/src/engine/ai_readiness/mod.rs

//! AI 準備度アルゴリズム群 (AIRIX / AIRS / AICS)

pub mod aics;
pub mod airix;
pub mod airs;

use super::response::{mean_score, AssessmentResponse, ResponseValue};
use serde::{Deserialize, Serialize};

pub use aics::{calculate_aics, AicsMetrics};
pub use airix::{calculate_airix, AirixMetrics};
pub use airs::{calculate_airs, AirsMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// 1件の回答を 0-1 に換算 (数値は 0-4 段階を想定)
pub fn response_score(response: &AssessmentResponse) -> f64 {
    match &response.value {
        Some(ResponseValue::Number(v)) => v / 4.0,
        Some(ResponseValue::Text(text)) => text_score(text),
        None => 0.5,
    }
}

// 否定形や強調形を含む語句から順に判定する
fn text_score(text: &str) -> f64 {
    let value = text.to_lowercase();
    let has = |phrases: &[&str]| phrases.iter().any(|p| value.contains(p));

    if has(&["strongly disagree", "very poor"]) {
        0.2
    } else if has(&["strongly agree", "excellent"]) {
        1.0
    } else if has(&["disagree", "poor"]) {
        0.4
    } else if has(&["agree", "good"]) {
        0.8
    } else if has(&["neutral", "fair"]) {
        0.6
    } else {
        0.5
    }
}

/// 設問文またはセクションにキーワードを含む回答の平均スコア
pub(crate) fn keyword_score(responses: &[AssessmentResponse], keywords: &[&str]) -> f64 {
    mean_score(
        responses
            .iter()
            .filter(|r| keywords.iter().any(|k| r.question_contains(k) || r.section_contains(k))),
        response_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_score_checks_negations_first() {
        assert_eq!(text_score("Strongly disagree"), 0.2);
        assert_eq!(text_score("Disagree"), 0.4);
        assert_eq!(text_score("Strongly Agree"), 1.0);
        assert_eq!(text_score("agree"), 0.8);
        assert_eq!(text_score("very poor"), 0.2);
        assert_eq!(text_score("poor"), 0.4);
        assert_eq!(text_score("Neutral"), 0.6);
        assert_eq!(text_score("n/a"), 0.5);
    }

    #[test]
    fn test_keyword_score_matches_question_or_section() {
        let mut by_question = AssessmentResponse::numeric("q1", "General", 4.0);
        by_question.question = Some("Faculty support for AI".to_string());
        let by_section = AssessmentResponse::numeric("q2", "Faculty Readiness", 2.0);
        let other = AssessmentResponse::numeric("q3", "Budget", 0.0);

        let score = keyword_score(&[by_question, by_section, other], &["faculty"]);
        assert!((score - 0.75).abs() < 1e-9);
    }
}
