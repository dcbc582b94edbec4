// northpath-backend/src/engine/stats.rs

//! アルゴリズム共通の統計ユーティリティ

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightedInput {
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub score: f64,
    pub confidence: f64,
    pub percentile: f64,
    pub variance: f64,
    pub reliability: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub data_quality: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmPerformance {
    pub accuracy: f64,
    pub mean_squared_error: f64,
    pub mean_absolute_error: f64,
    pub r2_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkRanking {
    Below,
    At,
    Above,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub gaps: BTreeMap<String, f64>,
    pub ranking: BenchmarkRanking,
    pub recommendations: Vec<String>,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 母分散
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

pub fn weighted_score(inputs: &[WeightedInput]) -> f64 {
    let (sum, total_weight) = inputs.iter().fold((0.0, 0.0), |(s, w), input| {
        (s + input.value * input.weight, w + input.weight)
    });
    if total_weight > 0.0 {
        sum / total_weight
    } else {
        0.0
    }
}

pub fn normalize_score(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// 分布内でのパーセンタイル順位 (中点法)
pub fn percentile_rank(score: f64, distribution: &[f64]) -> f64 {
    if distribution.is_empty() {
        return 50.0;
    }
    let lower = distribution.iter().filter(|s| **s < score).count() as f64;
    let equal = distribution.iter().filter(|s| **s == score).count() as f64;
    ((lower + equal / 2.0) / distribution.len() as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn aggregate_metrics(metrics: &[f64], weights: Option<&[f64]>) -> ScoreMetrics {
    if metrics.is_empty() {
        return ScoreMetrics::default();
    }

    let equal_weight = 1.0 / metrics.len() as f64;
    let inputs: Vec<WeightedInput> = metrics
        .iter()
        .enumerate()
        .map(|(i, value)| WeightedInput {
            value: *value,
            weight: weights
                .and_then(|w| w.get(i).copied())
                .unwrap_or(equal_weight),
        })
        .collect();

    let m = mean(metrics);
    let variance = population_variance(metrics);
    let sd = variance.sqrt();

    ScoreMetrics {
        score: weighted_score(&inputs),
        confidence: (1.0 - sd / m.max(0.1)).max(0.0),
        percentile: 50.0,
        variance,
        reliability: (1.0 - sd / (m + 0.1)).clamp(0.0, 1.0),
    }
}

pub fn generate_insights(
    scores: &BTreeMap<String, f64>,
    thresholds: &BTreeMap<String, f64>,
    benchmarks: Option<&BTreeMap<String, f64>>,
) -> Vec<String> {
    let mut insights = Vec::new();

    for (metric, score) in scores {
        if let Some(threshold) = thresholds.get(metric).copied().filter(|t| *t != 0.0) {
            if *score >= threshold * 1.2 {
                insights.push(format!(
                    "Strong performance in {} ({:.1}%)",
                    metric,
                    score * 100.0
                ));
            } else if *score < threshold * 0.8 {
                insights.push(format!(
                    "Improvement opportunity in {} ({:.1}%)",
                    metric,
                    score * 100.0
                ));
            }
        }

        if let Some(benchmark) = benchmarks
            .and_then(|b| b.get(metric).copied())
            .filter(|b| *b != 0.0)
        {
            let variance = score - benchmark;
            if variance.abs() > 0.1 {
                let direction = if variance > 0.0 { "above" } else { "below" };
                insights.push(format!(
                    "{} is {:.1}% {} industry benchmark",
                    metric,
                    (variance * 100.0).abs(),
                    direction
                ));
            }
        }
    }

    insights
}

/// アセスメントデータの品質検証
///
/// `responses` は `{question, value}` の配列を想定する。値の想定範囲は 1-5。
pub fn validate_assessment_data(data: Option<&Value>) -> DataValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(data) = data.filter(|d| !d.is_null()) else {
        errors.push("Assessment data is missing".to_string());
        return DataValidation {
            is_valid: false,
            errors,
            warnings,
            data_quality: 0.0,
        };
    };

    let responses = data.get("responses").and_then(Value::as_array);
    if responses.is_none() {
        errors.push("Assessment responses are missing or invalid".to_string());
    }
    if data.get("organizationId").map_or(true, is_falsy) {
        warnings.push("Organization ID is missing".to_string());
    }
    if data.get("timestamp").map_or(true, is_falsy) {
        warnings.push("Assessment timestamp is missing".to_string());
    }

    let mut valid = 0usize;
    let total = responses.map_or(0, Vec::len);
    for response in responses.into_iter().flatten() {
        let has_question = response.get("question").is_some_and(|q| !is_falsy(q));
        let has_value = response.get("value").is_some_and(|v| !v.is_null());
        if has_question && has_value {
            valid += 1;
        } else {
            warnings.push(format!("Invalid response: {}", response));
        }

        if let Some(value) = response.get("value").and_then(Value::as_f64) {
            if !(1.0..=5.0).contains(&value) {
                warnings.push(format!(
                    "Response value out of expected range (1-5): {}",
                    value
                ));
            }
        }
    }

    let data_quality = if total > 0 {
        valid as f64 / total as f64
    } else {
        0.0
    };
    if data_quality < 0.7 {
        warnings.push(format!(
            "Low data quality: {:.1}% valid responses",
            data_quality * 100.0
        ));
    }

    DataValidation {
        is_valid: errors.is_empty() && data_quality >= 0.5,
        errors,
        warnings,
        data_quality,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

pub fn confidence_interval(
    score: f64,
    sample_size: usize,
    standard_error: f64,
    confidence_level: f64,
) -> Interval {
    let z = if (confidence_level - 0.90).abs() < f64::EPSILON {
        1.645
    } else if (confidence_level - 0.99).abs() < f64::EPSILON {
        2.576
    } else {
        1.96
    };
    let margin = if sample_size == 0 {
        0.0
    } else {
        z * standard_error / (sample_size as f64).sqrt()
    };

    Interval {
        lower: (score - margin).max(0.0),
        upper: (score + margin).min(1.0),
        margin,
    }
}

/// ピアソン相関係数
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mean_a, mean_b) = (mean(a), mean(b));
    let (mut numerator, mut denom_a, mut denom_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        numerator += dx * dy;
        denom_a += dx * dx;
        denom_b += dy * dy;
    }
    let denominator = (denom_a * denom_b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn smooth(scores: &[f64], window_size: usize) -> Vec<f64> {
    if scores.len() <= window_size {
        return scores.to_vec();
    }
    let half = window_size / 2;
    (0..scores.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(scores.len());
            mean(&scores[start..end])
        })
        .collect()
}

pub fn algorithm_performance(predicted: &[f64], actual: &[f64]) -> AlgorithmPerformance {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return AlgorithmPerformance {
            accuracy: 0.0,
            mean_squared_error: 1.0,
            mean_absolute_error: 1.0,
            r2_score: 0.0,
        };
    }

    let n = predicted.len() as f64;
    let pairs = predicted.iter().zip(actual);
    let mse = pairs.clone().map(|(p, a)| (p - a).powi(2)).sum::<f64>() / n;
    let mae = pairs.clone().map(|(p, a)| (p - a).abs()).sum::<f64>() / n;

    let actual_mean = mean(actual);
    let total_ss: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let residual_ss: f64 = pairs.map(|(p, a)| (a - p).powi(2)).sum();
    let r2 = if total_ss == 0.0 {
        0.0
    } else {
        1.0 - residual_ss / total_ss
    };

    AlgorithmPerformance {
        accuracy: (1.0 - mae).max(0.0),
        mean_squared_error: mse,
        mean_absolute_error: mae,
        r2_score: r2,
    }
}

pub fn benchmark_comparison(
    scores: &BTreeMap<String, f64>,
    benchmarks: &BTreeMap<String, f64>,
) -> BenchmarkComparison {
    let gaps: BTreeMap<String, f64> = scores
        .iter()
        .filter_map(|(metric, score)| {
            benchmarks
                .get(metric)
                .map(|benchmark| (metric.clone(), score - benchmark))
        })
        .collect();

    let average_gap = if gaps.is_empty() {
        0.0
    } else {
        gaps.values().sum::<f64>() / gaps.len() as f64
    };
    let ranking = if average_gap > 0.05 {
        BenchmarkRanking::Above
    } else if average_gap < -0.05 {
        BenchmarkRanking::Below
    } else {
        BenchmarkRanking::At
    };

    let mut recommendations: Vec<String> = gaps
        .iter()
        .filter_map(|(metric, gap)| {
            if *gap < -0.1 {
                Some(format!(
                    "Focus on improving {} - significant gap below benchmark",
                    metric
                ))
            } else if *gap > 0.1 {
                Some(format!(
                    "Leverage strength in {} - significantly above benchmark",
                    metric
                ))
            } else {
                None
            }
        })
        .collect();
    if recommendations.is_empty() {
        recommendations
            .push("Performance is generally aligned with industry benchmarks".to_string());
    }

    BenchmarkComparison {
        gaps,
        ranking,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_weighted_score_and_normalize() {
        let inputs = [
            WeightedInput { value: 1.0, weight: 1.0 },
            WeightedInput { value: 0.0, weight: 3.0 },
        ];
        assert!((weighted_score(&inputs) - 0.25).abs() < 1e-9);
        assert_eq!(weighted_score(&[]), 0.0);

        assert_eq!(normalize_score(3.0, 1.0, 1.0), 0.5);
        assert_eq!(normalize_score(7.0, 0.0, 5.0), 1.0);
        assert!((normalize_score(2.5, 0.0, 5.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_rank_midpoint() {
        assert_eq!(percentile_rank(0.5, &[]), 50.0);
        // 1 lower, 1 equal of 4 -> (1 + 0.5)/4
        assert!((percentile_rank(2.0, &[1.0, 2.0, 3.0, 4.0]) - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_metrics() {
        assert_eq!(aggregate_metrics(&[], None), ScoreMetrics::default());
        let metrics = aggregate_metrics(&[0.5, 0.5, 0.5], None);
        assert!((metrics.score - 0.5).abs() < 1e-9);
        assert_eq!(metrics.variance, 0.0);
        assert_eq!(metrics.confidence, 1.0);
        assert_eq!(metrics.percentile, 50.0);
    }

    #[test]
    fn test_generate_insights() {
        let insights = generate_insights(
            &map(&[("culture", 0.9), ("tech", 0.3)]),
            &map(&[("culture", 0.7), ("tech", 0.6)]),
            Some(&map(&[("tech", 0.6)])),
        );
        assert!(insights.contains(&"Strong performance in culture (90.0%)".to_string()));
        assert!(insights.contains(&"Improvement opportunity in tech (30.0%)".to_string()));
        assert!(insights.contains(&"tech is 30.0% below industry benchmark".to_string()));
    }

    #[test]
    fn test_validate_assessment_data() {
        let missing = validate_assessment_data(None);
        assert!(!missing.is_valid);
        assert_eq!(missing.errors, vec!["Assessment data is missing"]);

        let data = json!({
            "organizationId": "org-1",
            "timestamp": "2025-01-01",
            "responses": [
                {"question": "q1", "value": 4},
                {"question": "q2", "value": 9},
                {"value": 3}
            ]
        });
        let result = validate_assessment_data(Some(&data));
        assert!(result.is_valid);
        assert!((result.data_quality - 2.0 / 3.0).abs() < 1e-9);
        assert!(result
            .warnings
            .iter()
            .any(|w| w == "Response value out of expected range (1-5): 9"));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Low data quality: 66.7%")));
    }

    #[test]
    fn test_confidence_interval_and_correlation() {
        let interval = confidence_interval(0.5, 4, 0.2, 0.95);
        assert!((interval.margin - 0.196).abs() < 1e-9);
        assert!((interval.lower - 0.304).abs() < 1e-9);

        assert!((correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-9);
        assert_eq!(correlation(&[1.0, 1.0], &[2.0, 3.0]), 0.0);
        assert_eq!(correlation(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_smoothing_and_performance() {
        assert_eq!(smooth(&[1.0, 2.0], 3), vec![1.0, 2.0]);
        let smoothed = smooth(&[0.0, 3.0, 0.0, 3.0], 3);
        assert!((smoothed[0] - 1.5).abs() < 1e-9);
        assert!((smoothed[1] - 1.0).abs() < 1e-9);

        let perf = algorithm_performance(&[0.5, 0.5], &[0.5, 0.5]);
        assert_eq!(perf.accuracy, 1.0);
        assert_eq!(perf.r2_score, 0.0);
        assert_eq!(algorithm_performance(&[], &[]).mean_squared_error, 1.0);
    }

    #[test]
    fn test_benchmark_comparison() {
        let result = benchmark_comparison(
            &map(&[("culture", 0.95), ("tech", 0.4), ("extra", 0.1)]),
            &map(&[("culture", 0.6), ("tech", 0.6)]),
        );
        assert_eq!(result.gaps.len(), 2);
        assert_eq!(result.ranking, BenchmarkRanking::Above);
        assert_eq!(result.recommendations.len(), 2);

        let aligned = benchmark_comparison(&map(&[("a", 0.5)]), &map(&[("a", 0.52)]));
        assert_eq!(aligned.ranking, BenchmarkRanking::At);
        assert_eq!(
            aligned.recommendations,
            vec!["Performance is generally aligned with industry benchmarks"]
        );
    }
}
