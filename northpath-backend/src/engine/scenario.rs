// northpath-backend/src/engine/scenario.rs

//! 現行組織 (baseline) と再編案 (variant) の比較

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const SCENARIO_ENGINE_VERSION: &str = "2.3.0";

// --- シナリオデータ -------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartNode {
    pub id: String,
    pub name: String,
    pub title: String,
    pub department: String,
    pub level: u32,
    pub direct_reports: Vec<ChartNode>,
    pub cost_center_id: Option<String>,
    pub salary: Option<f64>,
    pub benefits: Option<f64>,
    pub overhead: Option<f64>,
}

impl ChartNode {
    pub fn own_cost(&self) -> f64 {
        self.salary.unwrap_or(0.0) + self.benefits.unwrap_or(0.0) + self.overhead.unwrap_or(0.0)
    }

    /// 配下を含む人件費総額
    pub fn total_cost(&self) -> f64 {
        self.own_cost() + self.direct_reports.iter().map(ChartNode::total_cost).sum::<f64>()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostBreakdown {
    pub salaries: f64,
    pub benefits: f64,
    pub overhead: f64,
    pub technology: f64,
    pub facilities: f64,
    pub other: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostCenter {
    pub id: String,
    pub name: String,
    pub category: String,
    pub annual_budget: f64,
    pub actual_cost: f64,
    pub employees: u32,
    pub cost_per_employee: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostStructure {
    pub total_annual_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub cost_centers: Vec<CostCenter>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationMetrics {
    pub total_employees: f64,
    pub management_layers: f64,
    pub average_span_of_control: f64,
    pub management_ratio: f64,
    pub cost_per_employee: f64,
    pub total_annual_cost: f64,
    pub department_count: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectedMetrics {
    #[serde(flatten)]
    pub base: OrganizationMetrics,
    pub projected_savings: f64,
    pub efficiency_gains: f64,
    pub risk_adjustment: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeRecord {
    pub id: String,
    pub name: String,
    pub title: String,
    pub department: String,
    pub manager_id: Option<String>,
    pub salary: f64,
    pub benefits: f64,
    pub start_date: Option<String>,
    pub level: u32,
    pub is_manager: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub manager_id: String,
    pub parent_department_id: Option<String>,
    pub cost_center_id: Option<String>,
    pub employee_count: u32,
    pub annual_budget: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    #[default]
    Restructure,
    EliminatePosition,
    AddPosition,
    ChangeReporting,
    MergeDepartments,
    SplitDepartment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskRating {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationalChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub description: String,
    pub affected_employees: Vec<String>,
    pub cost_impact: f64,
    pub timeframe: String,
    pub risk_level: RiskRating,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImplementationRisk {
    #[serde(rename = "type")]
    pub risk_type: String,
    pub description: String,
    pub probability: f64,
    pub impact: f64,
    pub mitigation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImplementationStep {
    pub id: String,
    pub phase: u32,
    pub description: String,
    /// 週単位
    pub duration: u32,
    pub cost: f64,
    pub resources: Vec<String>,
    pub risks: Vec<ImplementationRisk>,
    pub dependencies: Vec<String>,
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationalBaseline {
    pub organization_chart: ChartNode,
    pub cost_structure: CostStructure,
    pub current_metrics: OrganizationMetrics,
    pub employee_data: Vec<EmployeeRecord>,
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationalVariant {
    pub proposed_chart: ChartNode,
    pub proposed_cost_structure: CostStructure,
    pub projected_metrics: ProjectedMetrics,
    pub changes_required: Vec<OrganizationalChange>,
    pub implementation_plan: Vec<ImplementationStep>,
}

// --- ポジション -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryBand {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

/// 比較対象の入力 (欠損値は正規化時に補う)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub level: Option<u32>,
    pub total_cost: Option<f64>,
    pub benefits: Option<f64>,
    pub overhead: Option<f64>,
    pub salary_band: Option<SalaryBand>,
    pub fte: Option<f64>,
    pub reporting_to: Option<String>,
    pub subordinates: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub title: String,
    pub department: String,
    pub level: u32,
    pub total_cost: f64,
    pub benefits: f64,
    pub overhead: f64,
    pub salary_band: SalaryBand,
    pub fte: f64,
    pub reporting_to: Option<String>,
    pub subordinates: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn normalize_positions(inputs: Vec<PositionInput>) -> Vec<Position> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let total_cost = input.total_cost.unwrap_or(0.0);
            Position {
                id: non_empty(input.id).unwrap_or_else(|| format!("pos_{}", index)),
                title: non_empty(input.title).unwrap_or_else(|| "Unknown Position".to_string()),
                department: non_empty(input.department).unwrap_or_else(|| "General".to_string()),
                level: input.level.filter(|l| *l != 0).unwrap_or(1),
                total_cost,
                benefits: non_zero(input.benefits).unwrap_or(total_cost * 0.3),
                overhead: non_zero(input.overhead).unwrap_or(total_cost * 0.15),
                salary_band: input.salary_band.unwrap_or(SalaryBand {
                    min: total_cost * 0.9,
                    max: total_cost * 1.1,
                    current: total_cost,
                }),
                fte: non_zero(input.fte).unwrap_or(1.0),
                reporting_to: input.reporting_to,
                subordinates: input.subordinates.unwrap_or_default(),
            }
        })
        .collect()
}

/// 組織図ツリーを前順にたどってポジション一覧に変換する
pub fn positions_from_chart(chart: &ChartNode) -> Vec<Position> {
    fn walk(node: &ChartNode, parent: Option<&str>, out: &mut Vec<PositionInput>) {
        if node.id.is_empty() && node.title.is_empty() && node.direct_reports.is_empty() {
            return;
        }
        out.push(PositionInput {
            id: Some(node.id.clone()),
            title: Some(node.title.clone()),
            department: Some(node.department.clone()),
            level: Some(node.level),
            total_cost: Some(node.own_cost()),
            benefits: node.benefits,
            overhead: node.overhead,
            salary_band: None,
            fte: Some(1.0),
            reporting_to: parent.map(str::to_string),
            subordinates: Some(node.direct_reports.iter().map(|r| r.id.clone()).collect()),
        });
        for report in &node.direct_reports {
            walk(report, Some(node.id.as_str()), out);
        }
    }

    let mut inputs = Vec::new();
    walk(chart, None, &mut inputs);
    normalize_positions(inputs)
}

// --- 比較 -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChange {
    pub op: ChangeOp,
    pub position_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

fn field_changes(base: &Position, variant: &Position) -> Vec<PositionChange> {
    let fields = [
        ("title", json!(base.title), json!(variant.title)),
        ("department", json!(base.department), json!(variant.department)),
        ("level", json!(base.level), json!(variant.level)),
        ("totalCost", json!(base.total_cost), json!(variant.total_cost)),
        ("fte", json!(base.fte), json!(variant.fte)),
        ("reportingTo", json!(base.reporting_to), json!(variant.reporting_to)),
    ];
    fields
        .into_iter()
        .filter(|(_, from, to)| from != to)
        .map(|(field, from, to)| PositionChange {
            op: ChangeOp::Replace,
            position_id: base.id.clone(),
            field: Some(field.to_string()),
            from: Some(from),
            to: Some(to),
        })
        .collect()
}

struct StructuralAnalysis<'a> {
    added: Vec<&'a Position>,
    removed: Vec<&'a Position>,
    modified: Vec<(&'a Position, &'a Position)>,
}

fn analyze_structure<'a>(base: &'a [Position], variant: &'a [Position]) -> StructuralAnalysis<'a> {
    let base_ids: HashSet<&str> = base.iter().map(|p| p.id.as_str()).collect();
    let variant_map: HashMap<&str, &Position> =
        variant.iter().map(|p| (p.id.as_str(), p)).collect();

    let added = variant
        .iter()
        .filter(|p| !base_ids.contains(p.id.as_str()))
        .collect();

    let mut removed = Vec::new();
    let mut modified = Vec::new();
    for position in base {
        match variant_map.get(position.id.as_str()) {
            None => removed.push(position),
            Some(other) if !field_changes(position, other).is_empty() => {
                modified.push((position, *other))
            }
            Some(_) => {}
        }
    }

    StructuralAnalysis {
        added,
        removed,
        modified,
    }
}

/// ポジション単位の差分一覧
pub fn diff_positions(base: &[Position], variant: &[Position]) -> Vec<PositionChange> {
    let analysis = analyze_structure(base, variant);
    let mut changes = Vec::new();
    for position in analysis.removed {
        changes.push(PositionChange {
            op: ChangeOp::Remove,
            position_id: position.id.clone(),
            field: None,
            from: serde_json::to_value(position).ok(),
            to: None,
        });
    }
    for (b, v) in analysis.modified {
        changes.extend(field_changes(b, v));
    }
    for position in analysis.added {
        changes.push(PositionChange {
            op: ChangeOp::Add,
            position_id: position.id.clone(),
            field: None,
            from: None,
            to: serde_json::to_value(position).ok(),
        });
    }
    changes
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionTotals {
    pub baseline: usize,
    pub variant: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub baseline_cost: f64,
    pub variant_cost: f64,
    pub absolute_change: f64,
    pub percentage_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FteImpact {
    pub baseline_fte: f64,
    pub variant_fte: f64,
    pub fte_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub positions_added: usize,
    pub positions_removed: usize,
    pub positions_modified: usize,
    pub total_positions: PositionTotals,
    pub cost_summary: CostSummary,
    pub fte_impact: FteImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub changes: Vec<PositionChange>,
    pub delta_cost: f64,
    pub summary: ComparisonSummary,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

fn recommendations(summary: &ComparisonSummary) -> Vec<String> {
    let mut out = Vec::new();
    let pct = summary.cost_summary.percentage_change;
    if pct.abs() > 10.0 {
        out.push(if pct > 0.0 {
            "Significant cost increase detected. Consider phased implementation to manage budget impact."
        } else {
            "Substantial cost savings identified. Ensure quality of service is maintained during transition."
        });
    }

    let fte_change = summary.fte_impact.fte_change;
    if fte_change > 0.0 {
        out.push("Increased staffing requirements. Plan for recruitment and onboarding processes.");
    } else if fte_change < -5.0 {
        out.push(
            "Significant workforce reduction. Implement change management and support programs.",
        );
    }

    if summary.positions_added > 5 {
        out.push("Multiple new positions created. Ensure clear role definitions and reporting structures.");
    }
    if summary.positions_removed > 3 {
        out.push("Several positions eliminated. Review workload distribution to prevent overload.");
    }
    if summary.positions_modified > 10 {
        out.push(
            "Extensive role modifications. Provide comprehensive training and communication.",
        );
    }

    out.into_iter().map(str::to_string).collect()
}

fn risk_factors(summary: &ComparisonSummary) -> Vec<String> {
    let mut out = Vec::new();
    let baseline_positions = summary.total_positions.baseline as f64;

    if summary.cost_summary.percentage_change > 20.0 {
        out.push("High financial risk: Cost increase exceeds 20%");
    }
    if summary.fte_impact.fte_change < -0.2 * summary.fte_impact.baseline_fte {
        out.push("Operational risk: Workforce reduction exceeds 20%");
    }
    if summary.positions_modified as f64 > 0.5 * baseline_positions {
        out.push("Change management risk: Over 50% of positions modified");
    }
    if summary.positions_added as f64 > 0.3 * baseline_positions {
        out.push("Implementation risk: Significant new hiring required");
    }

    out.into_iter().map(str::to_string).collect()
}

fn total_cost(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.total_cost).sum()
}

fn total_fte(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.fte).sum()
}

/// ポジション一覧同士の詳細比較 (deltaCost = variant - baseline)
pub fn compare_positions(base: &[Position], variant: &[Position]) -> ScenarioComparison {
    let analysis = analyze_structure(base, variant);
    let baseline_cost = total_cost(base);
    let variant_cost = total_cost(variant);
    let delta_cost = variant_cost - baseline_cost;
    let baseline_fte = total_fte(base);
    let variant_fte = total_fte(variant);

    let summary = ComparisonSummary {
        positions_added: analysis.added.len(),
        positions_removed: analysis.removed.len(),
        positions_modified: analysis.modified.len(),
        total_positions: PositionTotals {
            baseline: base.len(),
            variant: variant.len(),
        },
        cost_summary: CostSummary {
            baseline_cost,
            variant_cost,
            absolute_change: delta_cost,
            percentage_change: if baseline_cost > 0.0 {
                delta_cost / baseline_cost * 100.0
            } else {
                0.0
            },
        },
        fte_impact: FteImpact {
            baseline_fte,
            variant_fte,
            fte_change: variant_fte - baseline_fte,
        },
    };

    ScenarioComparison {
        changes: diff_positions(base, variant),
        delta_cost,
        recommendations: recommendations(&summary),
        risk_factors: risk_factors(&summary),
        summary,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleComparison {
    pub changes: Vec<PositionChange>,
    pub delta_cost: f64,
}

/// 簡易比較 (deltaCost = baseline - variant で削減額を正とする)
pub fn compare_scenarios(base: &[Position], variant: &[Position]) -> SimpleComparison {
    SimpleComparison {
        changes: diff_positions(base, variant),
        delta_cost: total_cost(base) - total_cost(variant),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAnalysis {
    pub department_name: String,
    pub baseline_positions: Vec<Position>,
    pub variant_positions: Vec<Position>,
    pub cost_change: f64,
    pub fte_change: f64,
    pub structural_changes: Vec<String>,
}

fn group_by_department(positions: &[Position]) -> BTreeMap<String, Vec<Position>> {
    let mut groups: BTreeMap<String, Vec<Position>> = BTreeMap::new();
    for position in positions {
        let department = if position.department.is_empty() {
            "General".to_string()
        } else {
            position.department.clone()
        };
        groups.entry(department).or_default().push(position.clone());
    }
    groups
}

fn department_structural_changes(base: &[Position], variant: &[Position]) -> Vec<String> {
    let mut changes = Vec::new();
    if variant.len() > base.len() {
        changes.push(format!("Added {} positions", variant.len() - base.len()));
    } else if variant.len() < base.len() {
        changes.push(format!("Removed {} positions", base.len() - variant.len()));
    }

    let base_levels: HashSet<u32> = base.iter().map(|p| p.level).collect();
    let variant_levels: HashSet<u32> = variant.iter().map(|p| p.level).collect();
    if base_levels.len() != variant_levels.len() {
        changes.push(format!(
            "Management levels changed from {} to {}",
            base_levels.len(),
            variant_levels.len()
        ));
    }
    changes
}

/// 部署別の比較 (コスト変動の絶対値が大きい順)
pub fn analyze_departments(base: &[Position], variant: &[Position]) -> Vec<DepartmentAnalysis> {
    let mut base_groups = group_by_department(base);
    let mut variant_groups = group_by_department(variant);
    let names: Vec<String> = base_groups
        .keys()
        .chain(variant_groups.keys())
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut analyses: Vec<DepartmentAnalysis> = names
        .into_iter()
        .map(|name| {
            let baseline_positions = base_groups.remove(&name).unwrap_or_default();
            let variant_positions = variant_groups.remove(&name).unwrap_or_default();
            DepartmentAnalysis {
                cost_change: total_cost(&variant_positions) - total_cost(&baseline_positions),
                fte_change: total_fte(&variant_positions) - total_fte(&baseline_positions),
                structural_changes: department_structural_changes(
                    &baseline_positions,
                    &variant_positions,
                ),
                department_name: name,
                baseline_positions,
                variant_positions,
            }
        })
        .collect();

    analyses.sort_by(|a, b| b.cost_change.abs().total_cmp(&a.cost_change.abs()));
    analyses
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStats {
    pub average: f64,
    pub max: usize,
    pub distribution: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanOfControlAnalysis {
    pub baseline: SpanStats,
    pub variant: SpanStats,
    pub improvement: f64,
}

pub fn span_stats(positions: &[Position]) -> SpanStats {
    let counts: Vec<usize> = positions.iter().map(|p| p.subordinates.len()).collect();
    let managers: Vec<usize> = counts.iter().copied().filter(|c| *c > 0).collect();

    let mut distribution = BTreeMap::new();
    for count in &counts {
        *distribution.entry(*count).or_insert(0) += 1;
    }

    SpanStats {
        average: if managers.is_empty() {
            0.0
        } else {
            managers.iter().sum::<usize>() as f64 / managers.len() as f64
        },
        max: counts.iter().copied().max().unwrap_or(0),
        distribution,
    }
}

pub fn analyze_span_of_control(base: &[Position], variant: &[Position]) -> SpanOfControlAnalysis {
    let baseline = span_stats(base);
    let variant = span_stats(variant);
    SpanOfControlAnalysis {
        improvement: variant.average - baseline.average,
        baseline,
        variant,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetadata {
    pub generated_at: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEngineResult {
    pub comparison: ScenarioComparison,
    pub department_analysis: Vec<DepartmentAnalysis>,
    pub span_of_control_analysis: SpanOfControlAnalysis,
    pub metadata: EngineMetadata,
}

/// 組織図ベースのシナリオ一式を分析する
pub fn run_scenario_engine(
    baseline: &OrganizationalBaseline,
    variant: &OrganizationalVariant,
) -> ScenarioEngineResult {
    let base_positions = positions_from_chart(&baseline.organization_chart);
    let variant_positions = positions_from_chart(&variant.proposed_chart);

    ScenarioEngineResult {
        comparison: compare_positions(&base_positions, &variant_positions),
        department_analysis: analyze_departments(&base_positions, &variant_positions),
        span_of_control_analysis: analyze_span_of_control(&base_positions, &variant_positions),
        metadata: EngineMetadata {
            generated_at: Utc::now(),
            version: SCENARIO_ENGINE_VERSION.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: &str, department: &str, cost: f64) -> PositionInput {
        PositionInput {
            id: Some(id.to_string()),
            title: Some(format!("Title {id}")),
            department: Some(department.to_string()),
            total_cost: Some(cost),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let positions = normalize_positions(vec![PositionInput {
            total_cost: Some(100_000.0),
            ..Default::default()
        }]);
        let p = &positions[0];
        assert_eq!(p.id, "pos_0");
        assert_eq!(p.title, "Unknown Position");
        assert_eq!(p.department, "General");
        assert_eq!(p.level, 1);
        assert_eq!(p.benefits, 30_000.0);
        assert_eq!(p.overhead, 15_000.0);
        assert_eq!(p.salary_band.min, 90_000.0);
        assert!((p.salary_band.max - 110_000.0).abs() < 1e-6);
        assert_eq!(p.fte, 1.0);
    }

    #[test]
    fn test_compare_positions_counts_changes() {
        let base = normalize_positions(vec![
            position("a", "IT", 100_000.0),
            position("b", "IT", 80_000.0),
            position("c", "HR", 60_000.0),
        ]);
        let mut modified = position("b", "IT", 90_000.0);
        modified.title = Some("Senior b".to_string());
        let variant = normalize_positions(vec![
            position("a", "IT", 100_000.0),
            modified,
            position("d", "Finance", 70_000.0),
        ]);

        let result = compare_positions(&base, &variant);
        assert_eq!(result.summary.positions_added, 1);
        assert_eq!(result.summary.positions_removed, 1);
        assert_eq!(result.summary.positions_modified, 1);
        assert_eq!(result.delta_cost, 20_000.0);
        // remove 1, 変更フィールド2 (title, totalCost), add 1
        assert_eq!(result.changes.len(), 4);
        assert_eq!(result.changes[0].op, ChangeOp::Remove);
        assert_eq!(result.changes.last().map(|c| c.op), Some(ChangeOp::Add));
    }

    #[test]
    fn test_legacy_compare_reports_savings_as_positive() {
        let base = normalize_positions(vec![position("a", "IT", 100_000.0)]);
        let variant = normalize_positions(vec![position("a", "IT", 70_000.0)]);
        assert_eq!(compare_scenarios(&base, &variant).delta_cost, 30_000.0);
        assert_eq!(compare_positions(&base, &variant).delta_cost, -30_000.0);
    }

    #[test]
    fn test_recommendations_and_risks() {
        let base = normalize_positions(
            (0..10).map(|i| position(&format!("p{i}"), "Ops", 100_000.0)).collect(),
        );
        let variant = normalize_positions(
            (0..3).map(|i| position(&format!("p{i}"), "Ops", 100_000.0)).collect(),
        );
        let result = compare_positions(&base, &variant);

        assert!(result.recommendations.contains(
            &"Substantial cost savings identified. Ensure quality of service is maintained during transition.".to_string()
        ));
        assert!(result.recommendations.iter().any(|r| r.starts_with("Significant workforce reduction")));
        assert!(result.recommendations.iter().any(|r| r.starts_with("Several positions eliminated")));
        assert_eq!(
            result.risk_factors,
            vec!["Operational risk: Workforce reduction exceeds 20%".to_string()]
        );
    }

    #[test]
    fn test_cost_increase_risk() {
        let base = normalize_positions(vec![position("a", "IT", 100_000.0)]);
        let variant = normalize_positions(vec![
            position("a", "IT", 100_000.0),
            position("b", "IT", 100_000.0),
        ]);
        let result = compare_positions(&base, &variant);
        assert!(result.recommendations[0].starts_with("Significant cost increase"));
        assert!(result
            .risk_factors
            .contains(&"High financial risk: Cost increase exceeds 20%".to_string()));
        assert!(result
            .risk_factors
            .contains(&"Implementation risk: Significant new hiring required".to_string()));
    }

    #[test]
    fn test_department_analysis_sorted_by_impact() {
        let base = normalize_positions(vec![
            position("a", "IT", 100_000.0),
            position("b", "HR", 50_000.0),
        ]);
        let variant = normalize_positions(vec![position("b", "HR", 40_000.0)]);
        let analysis = analyze_departments(&base, &variant);

        assert_eq!(analysis[0].department_name, "IT");
        assert_eq!(analysis[0].cost_change, -100_000.0);
        assert_eq!(
            analysis[0].structural_changes,
            vec![
                "Removed 1 positions".to_string(),
                "Management levels changed from 1 to 0".to_string()
            ]
        );
        assert_eq!(analysis[1].cost_change, -10_000.0);
    }

    fn chart() -> ChartNode {
        ChartNode {
            id: "ceo".into(),
            title: "CEO".into(),
            department: "Executive".into(),
            level: 1,
            salary: Some(200_000.0),
            direct_reports: vec![
                ChartNode {
                    id: "a".into(),
                    title: "Analyst".into(),
                    department: "Ops".into(),
                    level: 2,
                    salary: Some(60_000.0),
                    ..Default::default()
                },
                ChartNode {
                    id: "b".into(),
                    title: "Analyst".into(),
                    department: "Ops".into(),
                    level: 2,
                    salary: Some(60_000.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_positions_from_chart() {
        let positions = positions_from_chart(&chart());
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0].subordinates, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(positions[1].reporting_to.as_deref(), Some("ceo"));
        assert!(positions_from_chart(&ChartNode::default()).is_empty());
        assert_eq!(chart().total_cost(), 320_000.0);
    }

    #[test]
    fn test_run_scenario_engine() {
        let baseline = OrganizationalBaseline {
            organization_chart: chart(),
            ..Default::default()
        };
        let mut proposed = chart();
        proposed.direct_reports.pop();
        let variant = OrganizationalVariant {
            proposed_chart: proposed,
            ..Default::default()
        };

        let result = run_scenario_engine(&baseline, &variant);
        assert_eq!(result.metadata.version, "2.3.0");
        assert_eq!(result.comparison.summary.positions_removed, 1);
        // ceo の subordinates が変わっても比較対象フィールドではない
        assert_eq!(result.comparison.summary.positions_modified, 0);
        assert_eq!(result.span_of_control_analysis.baseline.average, 2.0);
        assert_eq!(result.span_of_control_analysis.improvement, -1.0);
        assert_eq!(result.span_of_control_analysis.baseline.distribution[&0], 2);
    }
}
