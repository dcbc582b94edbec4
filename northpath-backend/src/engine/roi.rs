// northpath-backend/src/engine/roi.rs

//! 再編シナリオの投資対効果 (ROI) 分析

use super::scenario::{OrganizationalBaseline, OrganizationalVariant};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MONTE_CARLO_ITERATIONS: usize = 10_000;
pub const MAX_MONTE_CARLO_ITERATIONS: usize = 10_000;

const IRR_INITIAL_GUESS: f64 = 0.1;
const IRR_MAX_ITERATIONS: usize = 100;
const IRR_TOLERANCE: f64 = 1e-4;

const SPAN_GAIN_PER_UNIT: f64 = 10_000.0;
const MANAGEMENT_GAIN_PER_EMPLOYEE: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationType {
    Simple,
    #[default]
    Detailed,
    MonteCarlo,
    Sensitivity,
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationType::Simple => write!(f, "SIMPLE"),
            CalculationType::Detailed => write!(f, "DETAILED"),
            CalculationType::MonteCarlo => write!(f, "MONTE_CARLO"),
            CalculationType::Sensitivity => write!(f, "SENSITIVITY"),
        }
    }
}

impl FromStr for CalculationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SIMPLE" => Ok(CalculationType::Simple),
            "DETAILED" => Ok(CalculationType::Detailed),
            "MONTE_CARLO" => Ok(CalculationType::MonteCarlo),
            "SENSITIVITY" => Ok(CalculationType::Sensitivity),
            _ => Err(format!("Invalid calculation type: {}", s)),
        }
    }
}

/// 未指定の項目は既定値で補う
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoiAssumptions {
    pub discount_rate: f64,
    pub inflation_rate: f64,
    /// 年数
    pub time_horizon: u32,
    pub risk_premium: f64,
    pub implementation_success: f64,
    pub savings_realization: f64,
    pub custom_assumptions: Map<String, Value>,
}

impl Default for RoiAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: 0.08,
            inflation_rate: 0.03,
            time_horizon: 5,
            risk_premium: 0.02,
            implementation_success: 0.85,
            savings_realization: 0.90,
            custom_assumptions: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub initial_investment: f64,
    pub implementation_cost: f64,
    pub annual_savings: f64,
    pub operational_cost_change: f64,
    pub roi_percentage: f64,
    /// 月数
    pub payback_period: f64,
    pub npv: f64,
    pub irr: f64,
    pub break_even_point: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityVariable {
    pub name: String,
    pub base_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityScenario {
    pub name: String,
    pub variables: BTreeMap<String, f64>,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityResult {
    pub scenario: String,
    pub roi_change: f64,
    pub npv_change: f64,
    pub payback_period_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub variables: Vec<SensitivityVariable>,
    pub scenarios: Vec<SensitivityScenario>,
    pub results: Vec<SensitivityResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
    pub percentiles: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResults {
    pub iterations: usize,
    pub roi_distribution: Distribution,
    pub npv_distribution: Distribution,
    pub success_probability: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationType {
    Proceed,
    Modify,
    Reject,
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiRecommendation {
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub priority: RecommendationPriority,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_approaches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_mitigation: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiAnalysis {
    pub calculation_type: CalculationType,
    pub financial_metrics: FinancialMetrics,
    pub assumptions: RoiAssumptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_analysis: Option<SensitivityAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monte_carlo_results: Option<MonteCarloResults>,
    pub recommendations: Vec<RoiRecommendation>,
}

// --- 財務指標 -------------------------------------------------------------

pub fn implementation_cost(variant: &OrganizationalVariant) -> f64 {
    let plan: f64 = variant.implementation_plan.iter().map(|s| s.cost).sum();
    let changes: f64 = variant
        .changes_required
        .iter()
        .map(|c| c.cost_impact.abs())
        .sum();
    plan + changes
}

fn efficiency_gains(baseline: &OrganizationalBaseline, variant: &OrganizationalVariant) -> f64 {
    let current = &baseline.current_metrics;
    let projected = &variant.projected_metrics.base;

    let span_gain =
        (projected.average_span_of_control - current.average_span_of_control) * SPAN_GAIN_PER_UNIT;
    let management_gain = (current.management_ratio - projected.management_ratio)
        * current.total_employees
        * MANAGEMENT_GAIN_PER_EMPLOYEE;

    (span_gain + management_gain).max(0.0)
}

pub fn annual_savings(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    assumptions: &RoiAssumptions,
) -> f64 {
    let salary_savings =
        baseline.organization_chart.total_cost() - variant.proposed_chart.total_cost();
    let overhead_savings = baseline.cost_structure.total_annual_cost
        - variant.proposed_cost_structure.total_annual_cost;

    let total = (salary_savings + overhead_savings + efficiency_gains(baseline, variant))
        * assumptions.savings_realization;
    total.max(0.0)
}

fn operational_cost_change(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
) -> f64 {
    variant.proposed_cost_structure.cost_breakdown.other - baseline.cost_structure.cost_breakdown.other
}

pub fn npv(initial_investment: f64, annual_cash_flow: f64, rate: f64, years: u32) -> f64 {
    (1..=years).fold(-initial_investment, |acc, year| {
        acc + annual_cash_flow / (1.0 + rate).powi(year as i32)
    })
}

/// ニュートン法による IRR
pub fn irr(initial_investment: f64, annual_cash_flow: f64, years: u32) -> f64 {
    let mut rate = IRR_INITIAL_GUESS;

    for _ in 0..IRR_MAX_ITERATIONS {
        let mut value = -initial_investment;
        let mut derivative = 0.0;
        for year in 1..=years {
            let factor = (1.0 + rate).powi(year as i32);
            value += annual_cash_flow / factor;
            derivative -= year as f64 * annual_cash_flow / (factor * (1.0 + rate));
        }

        let step = value / derivative;
        if !step.is_finite() {
            return rate;
        }
        let next = rate - step;
        if (next - rate).abs() < IRR_TOLERANCE {
            return next;
        }
        rate = next;
    }

    rate
}

pub fn financial_metrics(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    assumptions: &RoiAssumptions,
) -> FinancialMetrics {
    let investment = implementation_cost(variant);
    let savings = annual_savings(baseline, variant, assumptions);
    let operational_change = operational_cost_change(baseline, variant);
    let net = savings - operational_change;

    let payback_period = if investment > 0.0 && net > 0.0 {
        investment / net * 12.0
    } else {
        0.0
    };
    let roi_percentage = if investment == 0.0 {
        0.0
    } else {
        (net * assumptions.time_horizon as f64 - investment) / investment * 100.0
    };

    FinancialMetrics {
        initial_investment: investment,
        implementation_cost: investment,
        annual_savings: savings,
        operational_cost_change: operational_change,
        roi_percentage,
        payback_period,
        npv: npv(investment, net, assumptions.discount_rate, assumptions.time_horizon),
        irr: irr(investment, net, assumptions.time_horizon),
        break_even_point: payback_period,
    }
}

// --- 感度分析 -------------------------------------------------------------

const SAVINGS_REALIZATION: &str = "Savings Realization Rate";
const IMPLEMENTATION_SUCCESS: &str = "Implementation Success Rate";
const DISCOUNT_RATE: &str = "Discount Rate";

fn scenario(name: &str, probability: f64, values: [f64; 3]) -> SensitivityScenario {
    SensitivityScenario {
        name: name.to_string(),
        variables: BTreeMap::from([
            (SAVINGS_REALIZATION.to_string(), values[0]),
            (IMPLEMENTATION_SUCCESS.to_string(), values[1]),
            (DISCOUNT_RATE.to_string(), values[2]),
        ]),
        probability,
    }
}

fn apply_scenario(assumptions: &RoiAssumptions, scenario: &SensitivityScenario) -> RoiAssumptions {
    let value = |name: &str, current: f64| scenario.variables.get(name).copied().unwrap_or(current);
    RoiAssumptions {
        savings_realization: value(SAVINGS_REALIZATION, assumptions.savings_realization),
        implementation_success: value(IMPLEMENTATION_SUCCESS, assumptions.implementation_success),
        discount_rate: value(DISCOUNT_RATE, assumptions.discount_rate),
        ..assumptions.clone()
    }
}

/// 最良・標準・最悪の3ケースを再計算し、基準値からの差分を返す
pub fn sensitivity_analysis(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    assumptions: &RoiAssumptions,
) -> SensitivityAnalysis {
    let variables = vec![
        SensitivityVariable {
            name: SAVINGS_REALIZATION.to_string(),
            base_value: assumptions.savings_realization,
            min_value: 0.6,
            max_value: 1.0,
            impact: Impact::High,
        },
        SensitivityVariable {
            name: IMPLEMENTATION_SUCCESS.to_string(),
            base_value: assumptions.implementation_success,
            min_value: 0.7,
            max_value: 0.95,
            impact: Impact::High,
        },
        SensitivityVariable {
            name: DISCOUNT_RATE.to_string(),
            base_value: assumptions.discount_rate,
            min_value: 0.05,
            max_value: 0.12,
            impact: Impact::Medium,
        },
    ];

    let scenarios = vec![
        scenario("Best Case", 0.1, [1.0, 0.95, 0.05]),
        scenario(
            "Most Likely",
            0.7,
            [
                assumptions.savings_realization,
                assumptions.implementation_success,
                assumptions.discount_rate,
            ],
        ),
        scenario("Worst Case", 0.2, [0.6, 0.7, 0.12]),
    ];

    let base = financial_metrics(baseline, variant, assumptions);
    let results = scenarios
        .iter()
        .map(|s| {
            let metrics = financial_metrics(baseline, variant, &apply_scenario(assumptions, s));
            SensitivityResult {
                scenario: s.name.clone(),
                roi_change: metrics.roi_percentage - base.roi_percentage,
                npv_change: metrics.npv - base.npv,
                payback_period_change: metrics.payback_period - base.payback_period,
            }
        })
        .collect();

    SensitivityAnalysis {
        variables,
        scenarios,
        results,
    }
}

// --- モンテカルロ ---------------------------------------------------------

/// Box-Muller 変換による正規乱数
fn random_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // ln(0) を避けるため (0, 1] から取る
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + z * std_dev
}

fn distribution(mut values: Vec<f64>) -> Distribution {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let at = |p: f64| -> f64 {
        if n == 0 {
            return 0.0;
        }
        values[((n as f64 * p).floor() as usize).min(n - 1)]
    };

    let mean = if n == 0 {
        0.0
    } else {
        values.iter().sum::<f64>() / n as f64
    };
    let variance = if n == 0 {
        0.0
    } else {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
    };

    Distribution {
        mean,
        median: at(0.5),
        standard_deviation: variance.sqrt(),
        percentiles: BTreeMap::from([
            ("5".to_string(), at(0.05)),
            ("25".to_string(), at(0.25)),
            ("75".to_string(), at(0.75)),
            ("95".to_string(), at(0.95)),
        ]),
    }
}

pub fn monte_carlo_with_rng<R: Rng + ?Sized>(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    assumptions: &RoiAssumptions,
    iterations: usize,
    rng: &mut R,
) -> MonteCarloResults {
    let iterations = iterations.min(MAX_MONTE_CARLO_ITERATIONS);
    let mut roi_results = Vec::with_capacity(iterations);
    let mut npv_results = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let simulated = RoiAssumptions {
            savings_realization: random_normal(rng, assumptions.savings_realization, 0.1),
            implementation_success: random_normal(rng, assumptions.implementation_success, 0.05),
            discount_rate: random_normal(rng, assumptions.discount_rate, 0.01),
            ..assumptions.clone()
        };
        let metrics = financial_metrics(baseline, variant, &simulated);
        roi_results.push(metrics.roi_percentage);
        npv_results.push(metrics.npv);
    }

    let success_probability = if iterations == 0 {
        0.0
    } else {
        roi_results.iter().filter(|r| **r > 0.0).count() as f64 / iterations as f64
    };

    MonteCarloResults {
        iterations,
        roi_distribution: distribution(roi_results),
        npv_distribution: distribution(npv_results),
        success_probability,
        confidence: 0.95,
    }
}

pub fn monte_carlo(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    assumptions: &RoiAssumptions,
    iterations: usize,
) -> MonteCarloResults {
    monte_carlo_with_rng(
        baseline,
        variant,
        assumptions,
        iterations,
        &mut rand::thread_rng(),
    )
}

// --- 推奨 -----------------------------------------------------------------

fn strings(items: [&str; 2]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

pub fn recommendations(metrics: &FinancialMetrics) -> Vec<RoiRecommendation> {
    let roi = metrics.roi_percentage;
    let mut out = Vec::with_capacity(2);

    let primary = if roi > 20.0 {
        RoiRecommendation {
            recommendation_type: RecommendationType::Proceed,
            priority: RecommendationPriority::High,
            rationale: format!("Excellent ROI of {:.1}% exceeds target threshold", roi),
            conditions: strings(["Ensure implementation plan is realistic", "Monitor progress closely"]),
            alternative_approaches: None,
            risk_mitigation: None,
        }
    } else if roi > 10.0 {
        RoiRecommendation {
            recommendation_type: RecommendationType::Proceed,
            priority: RecommendationPriority::Medium,
            rationale: format!("Good ROI of {:.1}% justifies investment", roi),
            conditions: strings(["Review implementation risks", "Consider phased approach"]),
            alternative_approaches: None,
            risk_mitigation: None,
        }
    } else if roi > 0.0 {
        RoiRecommendation {
            recommendation_type: RecommendationType::Modify,
            priority: RecommendationPriority::Medium,
            rationale: format!("Marginal ROI of {:.1}% suggests optimization needed", roi),
            conditions: None,
            alternative_approaches: strings(["Reduce implementation costs", "Increase efficiency targets"]),
            risk_mitigation: None,
        }
    } else {
        RoiRecommendation {
            recommendation_type: RecommendationType::Reject,
            priority: RecommendationPriority::High,
            rationale: format!("Negative ROI of {:.1}% does not justify investment", roi),
            conditions: None,
            alternative_approaches: strings(["Redesign scenario", "Consider alternative approaches"]),
            risk_mitigation: None,
        }
    };
    out.push(primary);

    if metrics.payback_period > 36.0 {
        out.push(RoiRecommendation {
            recommendation_type: RecommendationType::Modify,
            priority: RecommendationPriority::Medium,
            rationale: format!("Long payback period of {:.1} months", metrics.payback_period),
            conditions: None,
            alternative_approaches: None,
            risk_mitigation: strings(["Accelerate benefit realization", "Reduce upfront costs"]),
        });
    }

    out
}

/// ROI 分析一式。感度分析は DETAILED/SENSITIVITY、モンテカルロは MONTE_CARLO のみ
pub fn calculate_roi(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
    calculation_type: CalculationType,
    assumptions: RoiAssumptions,
    iterations: usize,
) -> RoiAnalysis {
    let metrics = financial_metrics(baseline, variant, &assumptions);

    let sensitivity_analysis = matches!(
        calculation_type,
        CalculationType::Detailed | CalculationType::Sensitivity
    )
    .then(|| sensitivity_analysis(baseline, variant, &assumptions));

    let monte_carlo_results = (calculation_type == CalculationType::MonteCarlo)
        .then(|| monte_carlo(baseline, variant, &assumptions, iterations));

    RoiAnalysis {
        calculation_type,
        recommendations: recommendations(&metrics),
        financial_metrics: metrics,
        assumptions,
        sensitivity_analysis,
        monte_carlo_results,
    }
}
