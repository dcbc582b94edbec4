// northpath-backend/src/engine/cost.rs

//! 冗長ポジションに基づくコスト削減額の算出

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CONSERVATIVE_RATIO: f64 = 0.6;
const MODERATE_RATIO: f64 = 0.8;
const DEFAULT_BENEFITS_RATIO: f64 = 0.3;
const DEFAULT_OVERHEAD_RATIO: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPosition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub department: String,
    pub total_cost: f64,
    #[serde(default = "default_fte")]
    pub fte: f64,
    pub benefits: Option<f64>,
    pub overhead: Option<f64>,
}

fn default_fte() -> f64 {
    1.0
}

impl CostPosition {
    fn benefits_or_default(&self) -> f64 {
        self.benefits
            .filter(|b| *b != 0.0)
            .unwrap_or(self.total_cost * DEFAULT_BENEFITS_RATIO)
    }

    fn overhead_or_default(&self) -> f64 {
        self.overhead
            .filter(|o| *o != 0.0)
            .unwrap_or(self.total_cost * DEFAULT_OVERHEAD_RATIO)
    }
}

/// 保守・標準・積極の3シナリオ
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SavingsBands {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl SavingsBands {
    pub fn from_total(total: f64) -> Self {
        Self {
            conservative: total * CONSERVATIVE_RATIO,
            moderate: total * MODERATE_RATIO,
            aggressive: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub salary_reduction: SavingsBands,
    pub benefits_reduction: SavingsBands,
    pub overhead_reduction: SavingsBands,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCostAnalysis {
    pub total_position_cost: f64,
    pub redundant_cost: f64,
    pub redundancy_pct: f64,
    pub savings: SavingsBands,
    pub breakdown: CostBreakdown,
    pub affected_positions: Vec<CostPosition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiPoint {
    pub roi: f64,
    pub payback_months: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiTimeline {
    pub conservative: RoiPoint,
    pub moderate: RoiPoint,
    pub aggressive: RoiPoint,
}

pub fn calc_savings(positions: &[CostPosition], redundancy_pct: f64) -> SavingsBands {
    let redundant: f64 = positions.iter().map(|p| p.total_cost * redundancy_pct).sum();
    SavingsBands::from_total(redundant)
}

pub fn detailed_cost_analysis(
    positions: &[CostPosition],
    redundancy_pct: f64,
) -> DetailedCostAnalysis {
    let total_position_cost: f64 = positions.iter().map(|p| p.total_cost).sum();

    let total_salary: f64 = positions
        .iter()
        .map(|p| p.total_cost - p.benefits.unwrap_or(0.0) - p.overhead.unwrap_or(0.0))
        .sum();
    let total_benefits: f64 = positions.iter().map(CostPosition::benefits_or_default).sum();
    let total_overhead: f64 = positions.iter().map(CostPosition::overhead_or_default).sum();

    let affected_count = (positions.len() as f64 * redundancy_pct).ceil().max(0.0) as usize;
    let mut affected_positions = positions.to_vec();
    affected_positions.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    affected_positions.truncate(affected_count);

    DetailedCostAnalysis {
        total_position_cost,
        redundant_cost: total_position_cost * redundancy_pct,
        redundancy_pct,
        savings: calc_savings(positions, redundancy_pct),
        breakdown: CostBreakdown {
            salary_reduction: SavingsBands::from_total(total_salary * redundancy_pct),
            benefits_reduction: SavingsBands::from_total(total_benefits * redundancy_pct),
            overhead_reduction: SavingsBands::from_total(total_overhead * redundancy_pct),
        },
        affected_positions,
    }
}

/// 部署別の削減額 (部署未設定は "General"、冗長率未指定は 0)
pub fn department_savings(
    positions: &[CostPosition],
    redundancy_by_department: &BTreeMap<String, f64>,
) -> BTreeMap<String, SavingsBands> {
    let mut groups: BTreeMap<String, Vec<CostPosition>> = BTreeMap::new();
    for position in positions {
        let department = if position.department.is_empty() {
            "General".to_string()
        } else {
            position.department.clone()
        };
        groups.entry(department).or_default().push(position.clone());
    }

    groups
        .into_iter()
        .map(|(department, members)| {
            let pct = redundancy_by_department
                .get(&department)
                .copied()
                .unwrap_or(0.0);
            let savings = calc_savings(&members, pct);
            (department, savings)
        })
        .collect()
}

fn roi_point(savings: f64, implementation_cost: f64) -> RoiPoint {
    let roi = if implementation_cost == 0.0 {
        0.0
    } else {
        (savings - implementation_cost) / implementation_cost * 100.0
    };
    let payback_months = if implementation_cost > 0.0 && savings > 0.0 {
        implementation_cost / (savings / 12.0)
    } else {
        0.0
    };
    RoiPoint {
        roi,
        payback_months,
    }
}

pub fn roi_timeline(savings: &SavingsBands, implementation_cost: f64) -> RoiTimeline {
    RoiTimeline {
        conservative: roi_point(savings.conservative, implementation_cost),
        moderate: roi_point(savings.moderate, implementation_cost),
        aggressive: roi_point(savings.aggressive, implementation_cost),
    }
}

pub fn risk_adjusted_savings(savings: &SavingsBands, confidence: f64) -> SavingsBands {
    SavingsBands {
        conservative: savings.conservative * confidence,
        moderate: savings.moderate * (confidence * 0.9),
        aggressive: savings.aggressive * (confidence * 0.8),
    }
}

pub fn cost_savings_recommendations(analysis: &DetailedCostAnalysis) -> Vec<String> {
    let mut recommendations = Vec::new();

    if analysis.redundancy_pct > 0.2 {
        recommendations.push(
            "High redundancy detected (>20%). Consider comprehensive organizational restructuring."
                .to_string(),
        );
    }
    if analysis.savings.aggressive > 1_000_000.0 {
        recommendations.push(
            "Significant savings potential (>$1M). Phased implementation recommended to manage risk."
                .to_string(),
        );
    }
    if analysis.affected_positions.len() > 10 {
        recommendations.push(
            "Large number of positions affected. Develop comprehensive change management plan."
                .to_string(),
        );
    }
    if analysis.breakdown.benefits_reduction.moderate > analysis.breakdown.salary_reduction.moderate
    {
        recommendations.push(
            "Benefits represent significant cost component. Review benefits structure optimization."
                .to_string(),
        );
    }

    recommendations
}

/// "$1,234" 形式 (整数に丸めて3桁区切り)
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: &str, department: &str, cost: f64) -> CostPosition {
        CostPosition {
            id: id.to_string(),
            title: format!("Role {id}"),
            department: department.to_string(),
            total_cost: cost,
            fte: 1.0,
            benefits: None,
            overhead: None,
        }
    }

    #[test]
    fn test_savings_bands() {
        let savings = calc_savings(&[position("a", "IT", 100_000.0)], 0.5);
        assert_eq!(savings.aggressive, 50_000.0);
        assert_eq!(savings.moderate, 40_000.0);
        assert_eq!(savings.conservative, 30_000.0);
    }

    #[test]
    fn test_detailed_analysis_picks_costliest_positions() {
        let positions = vec![
            position("a", "IT", 50_000.0),
            position("b", "IT", 150_000.0),
            position("c", "HR", 100_000.0),
        ];
        let analysis = detailed_cost_analysis(&positions, 0.5);

        assert_eq!(analysis.total_position_cost, 300_000.0);
        assert_eq!(analysis.redundant_cost, 150_000.0);
        // ceil(3 * .5) = 2
        let ids: Vec<_> = analysis.affected_positions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!((analysis.breakdown.benefits_reduction.aggressive - 45_000.0).abs() < 1e-6);
        assert!((analysis.breakdown.overhead_reduction.aggressive - 22_500.0).abs() < 1e-6);
        assert!((analysis.breakdown.salary_reduction.aggressive - 150_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_department_savings_defaults() {
        let positions = vec![position("a", "", 100_000.0), position("b", "IT", 100_000.0)];
        let pct = BTreeMap::from([("General".to_string(), 0.1)]);
        let result = department_savings(&positions, &pct);

        assert_eq!(result["General"].aggressive, 10_000.0);
        assert_eq!(result["IT"].aggressive, 0.0);
    }

    #[test]
    fn test_roi_timeline_handles_zero_cost() {
        let savings = SavingsBands::from_total(120_000.0);
        let zero = roi_timeline(&savings, 0.0);
        assert_eq!(zero.aggressive.roi, 0.0);
        assert_eq!(zero.aggressive.payback_months, 0.0);

        let timeline = roi_timeline(&savings, 60_000.0);
        assert_eq!(timeline.aggressive.roi, 100.0);
        assert_eq!(timeline.aggressive.payback_months, 6.0);
    }

    #[test]
    fn test_risk_adjusted_savings() {
        let adjusted = risk_adjusted_savings(&SavingsBands::from_total(100.0), 0.5);
        assert!((adjusted.conservative - 30.0).abs() < 1e-9);
        assert!((adjusted.moderate - 36.0).abs() < 1e-9);
        assert!((adjusted.aggressive - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommendations() {
        let positions: Vec<_> = (0..40)
            .map(|i| position(&i.to_string(), "Ops", 100_000.0))
            .collect();
        let analysis = detailed_cost_analysis(&positions, 0.3);
        let recommendations = cost_savings_recommendations(&analysis);

        assert_eq!(recommendations.len(), 3);
        assert!(recommendations[0].starts_with("High redundancy detected"));
        assert!(recommendations[1].starts_with("Significant savings potential"));
        assert!(recommendations[2].starts_with("Large number of positions"));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_currency(1234.4), "$1,234");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000");
        assert_eq!(format_currency(-987.6), "-$988");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_percentage(12.345, 1), "12.3%");
        assert_eq!(format_percentage(5.0, 0), "5%");
    }
}
