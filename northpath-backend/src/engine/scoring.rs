// northpath-backend/src/engine/scoring.rs

//! v2.1 セグメント別スコアリング
//!
//! 0-4 のリッカート回答を4因子 (統制範囲・文化・技術適合・変革準備度) に分類し、
//! セグメントごとの重みで合成する。未回答 (0) はペナルティとして扱う。

use super::stats::{mean, population_std_dev};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const BLANK_PENALTY: f64 = 0.05;
const BLANK_CI_PENALTY: f64 = 0.02;
const BASE_ERROR: f64 = 0.08;
const MAX_OVERALL_INTERVAL: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    HigherEd,
    NonProfit,
    Healthcare,
    Government,
    ForProfit,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::HigherEd => "HIGHER_ED",
            Segment::NonProfit => "NON_PROFIT",
            Segment::Healthcare => "HEALTHCARE",
            Segment::Government => "GOVERNMENT",
            Segment::ForProfit => "FOR_PROFIT",
        };
        write!(f, "{}", s)
    }
}

impl Segment {
    /// 組織種別 (フォーム入力値) からセグメントを推定
    pub fn from_organization_type(org_type: &str) -> Self {
        let t = org_type.to_lowercase();
        if t.contains("college") || t.contains("university") || t.contains("higher") {
            Segment::HigherEd
        } else if t.contains("health") || t.contains("hospital") {
            Segment::Healthcare
        } else if t.contains("government") || t.contains("public") {
            Segment::Government
        } else if t.contains("nonprofit") || t.contains("non-profit") || t.contains("non_profit")
        {
            Segment::NonProfit
        } else {
            Segment::ForProfit
        }
    }

    pub fn weights(&self) -> FactorWeights {
        let (span_control, culture, tech_fit, readiness) = match self {
            Segment::HigherEd => (0.25, 0.25, 0.20, 0.30),
            Segment::NonProfit => (0.20, 0.30, 0.20, 0.30),
            Segment::Healthcare => (0.30, 0.20, 0.25, 0.25),
            Segment::Government => (0.35, 0.15, 0.20, 0.30),
            Segment::ForProfit => (0.30, 0.20, 0.30, 0.20),
        };
        FactorWeights {
            span_control,
            culture,
            tech_fit,
            readiness,
        }
    }

    /// ピア分布 (平均, 標準偏差)
    fn peer_distribution(&self) -> (f64, f64) {
        match self {
            Segment::HigherEd => (0.58, 0.18),
            Segment::NonProfit => (0.54, 0.21),
            Segment::Healthcare => (0.62, 0.16),
            Segment::Government => (0.51, 0.19),
            Segment::ForProfit => (0.64, 0.17),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub span_control: f64,
    pub culture: f64,
    pub tech_fit: f64,
    pub readiness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScores {
    pub span_control: f64,
    pub culture: f64,
    pub tech_fit: f64,
    pub readiness: f64,
}

impl FactorScores {
    fn as_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("spanControl".to_string(), self.span_control),
            ("culture".to_string(), self.culture),
            ("techFit".to_string(), self.tech_fit),
            ("readiness".to_string(), self.readiness),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub overall: f64,
    pub sections: BTreeMap<String, (f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutput {
    pub score: f64,
    pub tier: String,
    pub ci: f64,
    pub peer_percentile: f64,
    pub confidence: ConfidenceSummary,
    pub explainability: BTreeMap<String, String>,
    pub section_scores: BTreeMap<String, f64>,
}

const SPAN_KEYWORDS: [&str; 4] = ["span", "control", "oversight", "governance"];
const CULTURE_KEYWORDS: [&str; 4] = ["culture", "team", "collab", "comm"];
const TECH_KEYWORDS: [&str; 4] = ["tech", "digital", "system", "tool"];
const READINESS_KEYWORDS: [&str; 4] = ["ready", "change", "adapt", "transform"];

fn classify(normalized: &[(String, f64)], keywords: &[&str]) -> Vec<f64> {
    normalized
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            keywords.iter().any(|k| key.contains(k))
        })
        .map(|(_, v)| *v)
        .collect()
}

fn factor_score(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.5
    } else {
        mean(values)
    }
}

/// Abramowitz-Stegun による標準正規分布の累積分布関数近似
pub fn normal_cdf(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.2316419 * z.abs());
    let d = 0.3989423 * (-z * z / 2.0).exp();
    let prob =
        d * t * (0.3193815 + t * (-0.3565638 + t * (1.781478 + t * (-1.821256 + t * 1.330274))));
    if z > 0.0 {
        1.0 - prob
    } else {
        prob
    }
}

pub fn peer_percentile(score: f64, segment: Segment) -> f64 {
    let (peer_mean, peer_sd) = segment.peer_distribution();
    let z = (score - peer_mean) / peer_sd;
    (normal_cdf(z) * 100.0).round().clamp(1.0, 99.0)
}

pub fn assign_tier(score: f64, peer_percentile: f64) -> &'static str {
    let adjusted = score * 0.7 + (peer_percentile / 100.0) * 0.3;
    if adjusted >= 0.80 {
        "TRANSFORMING"
    } else if adjusted >= 0.65 {
        "GROWING"
    } else if adjusted >= 0.50 {
        "DEVELOPING"
    } else if adjusted >= 0.35 {
        "ESTABLISHING"
    } else {
        "EMERGING"
    }
}

fn count_blanks(answers: &BTreeMap<String, f64>) -> usize {
    answers.values().filter(|v| **v == 0.0).count()
}

pub fn confidence_intervals(
    answers: &BTreeMap<String, f64>,
    section_scores: &BTreeMap<String, f64>,
) -> ConfidenceSummary {
    if answers.is_empty() {
        return ConfidenceSummary {
            overall: 0.0,
            sections: BTreeMap::new(),
        };
    }

    let values: Vec<f64> = answers.values().copied().collect();
    let inconsistency = if values.len() < 2 {
        0.0
    } else {
        (population_std_dev(&values) / 2.0).min(1.0)
    };
    let consistency_adjustment = 1.0 + inconsistency;
    let overall = BASE_ERROR * (20.0 / answers.len().max(1) as f64).sqrt() * consistency_adjustment;

    let sections = section_scores
        .iter()
        .map(|(section, score)| {
            let matching = answers.keys().filter(|k| k.contains(section.as_str())).count();
            let error = BASE_ERROR * (5.0 / matching.max(1) as f64).sqrt() * consistency_adjustment;
            (
                section.clone(),
                ((score - error).max(0.0), (score + error).min(1.0)),
            )
        })
        .collect();

    ConfidenceSummary {
        overall: overall.min(MAX_OVERALL_INTERVAL),
        sections,
    }
}

/// v2.1 スコア算出
pub fn score_v21(answers: &BTreeMap<String, f64>, segment: Segment) -> ScoreOutput {
    let w = segment.weights();
    let normalized: Vec<(String, f64)> = answers
        .iter()
        .map(|(k, v)| (k.clone(), v / 4.0))
        .collect();

    let mut span = classify(&normalized, &SPAN_KEYWORDS);
    let mut culture = classify(&normalized, &CULTURE_KEYWORDS);
    let mut tech = classify(&normalized, &TECH_KEYWORDS);
    let mut readiness = classify(&normalized, &READINESS_KEYWORDS);

    // どの因子にも分類できない場合は均等に4分割
    if span.is_empty() && culture.is_empty() && tech.is_empty() && readiness.is_empty() {
        let all: Vec<f64> = normalized.iter().map(|(_, v)| *v).collect();
        let quarter = all.len().div_ceil(4).max(1);
        let mut chunks = all.chunks(quarter).map(<[f64]>::to_vec);
        span = chunks.next().unwrap_or_default();
        culture = chunks.next().unwrap_or_default();
        tech = chunks.next().unwrap_or_default();
        readiness = chunks.flatten().collect();
    }

    let factors = FactorScores {
        span_control: factor_score(&span),
        culture: factor_score(&culture),
        tech_fit: factor_score(&tech),
        readiness: factor_score(&readiness),
    };

    let base = w.span_control * factors.span_control
        + w.culture * factors.culture
        + w.tech_fit * factors.tech_fit
        + w.readiness * factors.readiness;

    let blanks = count_blanks(answers);
    let score = (base - blanks as f64 * BLANK_PENALTY).max(0.0);

    let normalized_values: Vec<f64> = normalized.iter().map(|(_, v)| *v).collect();
    let ci = if normalized_values.is_empty() {
        0.0
    } else {
        population_std_dev(&normalized_values) * 1.96 + blanks as f64 * BLANK_CI_PENALTY
    };

    let percentile = peer_percentile(score, segment);
    let tier = assign_tier(score, percentile).to_string();

    let explainability = BTreeMap::from([
        (
            "Overall Score".to_string(),
            format!(
                "{:.1}% based on weighted factors for {} segment",
                score * 100.0,
                segment
            ),
        ),
        (
            "Span of Control".to_string(),
            format!(
                "Weight: {}, Score: {:.1}%",
                w.span_control,
                factors.span_control * 100.0
            ),
        ),
        (
            "Culture".to_string(),
            format!("Weight: {}, Score: {:.1}%", w.culture, factors.culture * 100.0),
        ),
        (
            "Tech Fit".to_string(),
            format!("Weight: {}, Score: {:.1}%", w.tech_fit, factors.tech_fit * 100.0),
        ),
        (
            "Readiness".to_string(),
            format!(
                "Weight: {}, Score: {:.1}%",
                w.readiness,
                factors.readiness * 100.0
            ),
        ),
        (
            "Confidence".to_string(),
            format!("±{:.1}% ({} missing answers)", ci * 100.0, blanks),
        ),
        (
            "Peer Comparison".to_string(),
            format!("{:.0}th percentile in {} segment", percentile, segment),
        ),
    ]);

    let section_scores = factors.as_map();
    let confidence = confidence_intervals(answers, &section_scores);

    ScoreOutput {
        score,
        tier,
        ci,
        peer_percentile: percentile,
        confidence,
        explainability,
        section_scores,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnswer {
    pub question_id: String,
    pub section: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScoreResult {
    pub total_score: f64,
    pub tier: String,
    pub ci: f64,
    pub peer_percentile: f64,
    pub section_scores: BTreeMap<String, f64>,
    pub confidence_intervals: BTreeMap<String, (f64, f64)>,
    pub peer_benchmark: BTreeMap<String, f64>,
    pub explainability: BTreeMap<String, String>,
}

/// セクション単位の簡易スコア (旧形式の回答向け)
pub fn score_sections(responses: &[SectionAnswer]) -> SectionScoreResult {
    if responses.is_empty() {
        return SectionScoreResult {
            total_score: 0.0,
            tier: "Strategic Assessment".to_string(),
            ci: 0.0,
            peer_percentile: 0.0,
            section_scores: BTreeMap::new(),
            confidence_intervals: BTreeMap::new(),
            peer_benchmark: BTreeMap::new(),
            explainability: BTreeMap::new(),
        };
    }

    let answers: BTreeMap<String, f64> = responses
        .iter()
        .map(|r| (r.question_id.clone(), r.value))
        .collect();

    let mut by_section: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in responses {
        by_section
            .entry(r.section.clone())
            .or_default()
            .push(r.value / 4.0);
    }

    let mut result = SectionScoreResult {
        total_score: 0.0,
        tier: String::new(),
        ci: 0.0,
        peer_percentile: 0.0,
        section_scores: BTreeMap::new(),
        confidence_intervals: BTreeMap::new(),
        peer_benchmark: BTreeMap::new(),
        explainability: BTreeMap::new(),
    };

    for (section, values) in &by_section {
        let avg = mean(values);
        let sd = population_std_dev(values);
        result.section_scores.insert(section.clone(), avg);
        result
            .confidence_intervals
            .insert(section.clone(), (avg - 2.0 * sd, avg + 2.0 * sd));
        result.peer_benchmark.insert(section.clone(), 0.6);
        result.explainability.insert(
            section.clone(),
            format!("Score: {:.1}% for {}", avg * 100.0, section),
        );
    }

    let blanks = count_blanks(&answers);
    let normalized: Vec<f64> = answers.values().map(|v| v / 4.0).collect();
    result.ci = population_std_dev(&normalized) * 1.96 + blanks as f64 * BLANK_CI_PENALTY;

    let section_mean = mean(&result.section_scores.values().copied().collect::<Vec<_>>());
    result.total_score = (section_mean - blanks as f64 * BLANK_PENALTY).max(0.0);
    result.tier = if result.total_score >= 0.75 {
        "Implementation Support"
    } else if result.total_score >= 0.50 {
        "Transformation Planning"
    } else {
        "Strategic Assessment"
    }
    .to_string();
    result.peer_percentile = if result.total_score > 0.6 { 68.0 } else { 32.0 };

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_segment_weights_sum_to_one() {
        for segment in [
            Segment::HigherEd,
            Segment::NonProfit,
            Segment::Healthcare,
            Segment::Government,
            Segment::ForProfit,
        ] {
            let w = segment.weights();
            let total = w.span_control + w.culture + w.tech_fit + w.readiness;
            assert!((total - 1.0).abs() < 1e-9, "{segment}");
        }
    }

    #[test]
    fn test_normal_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.0) + normal_cdf(-1.0) - 1.0).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn test_percentile_is_clamped() {
        assert_eq!(peer_percentile(0.0, Segment::ForProfit), 1.0);
        assert_eq!(peer_percentile(1.5, Segment::HigherEd), 99.0);
        assert_eq!(peer_percentile(0.58, Segment::HigherEd), 50.0);
    }

    #[test]
    fn test_assign_tier_cutoffs() {
        assert_eq!(assign_tier(1.0, 99.0), "TRANSFORMING");
        assert_eq!(assign_tier(0.7, 50.0), "DEVELOPING");
        assert_eq!(assign_tier(0.0, 1.0), "EMERGING");
    }

    #[test]
    fn test_keyword_classification() {
        let result = score_v21(
            &answers(&[
                ("span_of_control", 4.0),
                ("team_culture", 2.0),
                ("tech_stack", 4.0),
                ("change_readiness", 2.0),
            ]),
            Segment::HigherEd,
        );
        assert_eq!(result.section_scores["spanControl"], 1.0);
        assert_eq!(result.section_scores["culture"], 0.5);
        // .25*1 + .25*.5 + .2*1 + .3*.5
        assert!((result.score - 0.725).abs() < 1e-9);
        assert_eq!(result.explainability.len(), 7);
    }

    #[test]
    fn test_unclassified_answers_split_into_quarters() {
        let result = score_v21(
            &answers(&[("a1", 4.0), ("a2", 4.0), ("a3", 2.0), ("a4", 2.0), ("a5", 2.0)]),
            Segment::ForProfit,
        );
        // ceil(5/4) = 2: [a1,a2] [a3,a4] [a5] []
        assert_eq!(result.section_scores["spanControl"], 1.0);
        assert_eq!(result.section_scores["culture"], 0.5);
        assert_eq!(result.section_scores["techFit"], 0.5);
        assert_eq!(result.section_scores["readiness"], 0.5);
    }

    #[test]
    fn test_blank_answers_are_penalized() {
        let full = score_v21(&answers(&[("q1", 4.0), ("q2", 4.0)]), Segment::Government);
        let with_blank = score_v21(
            &answers(&[("q1", 4.0), ("q2", 4.0), ("q3", 0.0)]),
            Segment::Government,
        );
        assert!(with_blank.score < full.score);
        assert!(with_blank.explainability["Confidence"].contains("(1 missing answers)"));
    }

    #[test]
    fn test_empty_answers() {
        let result = score_v21(&BTreeMap::new(), Segment::NonProfit);
        assert!((result.score - 0.5).abs() < 1e-9);
        assert_eq!(result.ci, 0.0);
        assert_eq!(result.confidence.overall, 0.0);
        assert!(result.confidence.sections.is_empty());
    }

    #[test]
    fn test_confidence_interval_cap() {
        let summary = confidence_intervals(
            &answers(&[("q1", 0.0), ("q2", 4.0)]),
            &BTreeMap::from([("q".to_string(), 0.5)]),
        );
        assert_eq!(summary.overall, 0.15);
        let (low, high) = summary.sections["q"];
        assert!(low >= 0.0 && high <= 1.0);
    }

    #[test]
    fn test_score_sections_legacy() {
        let empty = score_sections(&[]);
        assert_eq!(empty.tier, "Strategic Assessment");

        let responses = vec![
            SectionAnswer {
                question_id: "q1".into(),
                section: "Leadership".into(),
                value: 4.0,
            },
            SectionAnswer {
                question_id: "q2".into(),
                section: "Leadership".into(),
                value: 4.0,
            },
            SectionAnswer {
                question_id: "q3".into(),
                section: "Operations".into(),
                value: 3.0,
            },
        ];
        let result = score_sections(&responses);
        assert_eq!(result.section_scores["Leadership"], 1.0);
        assert!((result.total_score - 0.875).abs() < 1e-9);
        assert_eq!(result.tier, "Implementation Support");
        assert_eq!(result.peer_percentile, 68.0);
        assert_eq!(result.explainability["Operations"], "Score: 75.0% for Operations");
    }
}
