// northpath-backend/src/engine/org_chart.rs

//! 組織図の構築・コスト見積・再編シナリオ・エクスポート

use super::cost::format_currency;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use thiserror::Error;

/// 役職ごとの標準年間コスト (USD)
pub const ROLE_RATES: [(&str, f64); 18] = [
    ("CEO", 300000.0),
    ("CFO", 250000.0),
    ("CTO", 250000.0),
    ("VP", 180000.0),
    ("Director", 150000.0),
    ("Senior Manager", 120000.0),
    ("Manager", 95000.0),
    ("Senior Analyst", 80000.0),
    ("Analyst", 65000.0),
    ("Coordinator", 55000.0),
    ("Assistant", 45000.0),
    ("Administrator", 50000.0),
    ("Specialist", 70000.0),
    ("Lead", 85000.0),
    ("Principal", 140000.0),
    ("Senior Director", 200000.0),
    ("Executive", 220000.0),
    ("President", 350000.0),
];

const FALLBACK_RATE: f64 = 65000.0;
const MAX_DEPTH: usize = 10;

const NODE_WIDTH: f64 = 150.0;
const NODE_HEIGHT: f64 = 60.0;
const VERTICAL_SPACING: f64 = 100.0;

/// 構築を受け付ける階層の上限 (描画と刈り込みは階層ごとに再帰する)
pub const MAX_HIERARCHY_DEPTH: usize = 50;

const SVG_STYLE: &str = concat!(
    "<defs><style>",
    ".org-node { fill: #3b82f6; stroke: #1d4ed8; stroke-width: 2; } ",
    ".org-text { fill: white; font-family: Arial, sans-serif; font-size: 12px; text-anchor: middle; } ",
    ".org-link { stroke: #6b7280; stroke-width: 2; fill: none; }",
    "</style></defs>"
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInput {
    pub id: String,
    pub role_title: String,
    pub fte: f64,
    pub annual_cost: Option<f64>,
    pub parent_id: Option<String>,
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub id: String,
    pub role_title: String,
    pub fte: f64,
    #[serde(default)]
    pub annual_cost: f64,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub children: Vec<OrgNode>,
}

impl OrgNode {
    pub fn span_of_control(&self) -> usize {
        self.children.len()
    }

    /// 自身を含む配下のノード数
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

/// 前順 (pre-order) に並べたノード一覧
pub fn flatten(tree: &[OrgNode]) -> Vec<&OrgNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&OrgNode> = tree.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}

pub fn count_nodes(tree: &[OrgNode]) -> usize {
    tree.iter().map(OrgNode::node_count).sum()
}

pub fn max_depth(tree: &[OrgNode]) -> usize {
    tree.iter().map(OrgNode::depth).max().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("Organization hierarchy is {depth} levels deep (maximum {max})")]
    TooDeep { depth: usize, max: usize },
}

/// 役職一覧の親子関係 (インデックス表現)
struct Hierarchy {
    parent_of: Vec<Option<usize>>,
    children_of: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// ルートから幅優先でたどった順序と各ノードの階層
    order: Vec<usize>,
    levels: Vec<u32>,
}

impl Hierarchy {
    fn depth(&self) -> usize {
        self.levels.iter().max().map_or(0, |level| *level as usize + 1)
    }
}

fn find_set(sets: &mut [usize], mut x: usize) -> usize {
    while sets[x] != x {
        sets[x] = sets[sets[x]];
        x = sets[x];
    }
    x
}

/// 親が存在しない・自分自身・循環を作るリンクは捨てる
///
/// 受理済みのリンクは森を成し、未処理のノードは常に自分の木の根なので、
/// 親候補が同じ木に属していればリンクは循環を作る。
fn link(roles: &[RoleInput]) -> Hierarchy {
    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (i, role) in roles.iter().enumerate() {
        first_index.entry(role.id.as_str()).or_insert(i);
    }

    let mut sets: Vec<usize> = (0..roles.len()).collect();
    let mut parent_of: Vec<Option<usize>> = vec![None; roles.len()];
    for (i, role) in roles.iter().enumerate() {
        let Some(parent_idx) = role
            .parent_id
            .as_deref()
            .and_then(|p| first_index.get(p).copied())
        else {
            continue;
        };

        let own_set = find_set(&mut sets, i);
        let parent_set = find_set(&mut sets, parent_idx);
        if own_set != parent_set {
            parent_of[i] = Some(parent_idx);
            sets[own_set] = parent_set;
        }
    }

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); roles.len()];
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(p) = parent {
            children_of[*p].push(i);
        }
    }

    let roots: Vec<usize> = (0..roles.len())
        .filter(|i| parent_of[*i].is_none())
        .collect();
    let mut levels = vec![0u32; roles.len()];
    let mut order = roots.clone();
    let mut cursor = 0;
    while cursor < order.len() {
        let idx = order[cursor];
        for child in &children_of[idx] {
            levels[*child] = levels[idx] + 1;
            order.push(*child);
        }
        cursor += 1;
    }

    Hierarchy {
        parent_of,
        children_of,
        roots,
        order,
        levels,
    }
}

/// 子から順に組み立てる (子の順序は入力順)
fn assemble(roles: &[RoleInput], hierarchy: &Hierarchy) -> Vec<OrgNode> {
    let mut built: Vec<Option<OrgNode>> = vec![None; roles.len()];
    for idx in hierarchy.order.iter().rev() {
        let role = &roles[*idx];
        let children = hierarchy.children_of[*idx]
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[*idx] = Some(OrgNode {
            id: role.id.clone(),
            role_title: role.role_title.clone(),
            fte: role.fte,
            annual_cost: role.annual_cost.unwrap_or(0.0),
            parent_id: hierarchy.parent_of[*idx].map(|p| roles[p].id.clone()),
            level: hierarchy.levels[*idx],
            children,
        });
    }

    hierarchy
        .roots
        .iter()
        .filter_map(|root| built[*root].take())
        .collect()
}

/// フラットな役職一覧から階層を構築する
///
/// 親が存在しない・自分自身・循環を作る場合はルートとして扱う。
/// 子の順序は入力順を保持する。
pub fn build_tree(roles: &[RoleInput]) -> Vec<OrgNode> {
    assemble(roles, &link(roles))
}

/// 構築した場合の階層の深さ
pub fn hierarchy_depth(roles: &[RoleInput]) -> usize {
    link(roles).depth()
}

/// 役職別単価で年間コストを見積もる (custom_rates が標準単価を上書き)
pub fn estimate_cost(tree: &mut [OrgNode], custom_rates: &HashMap<String, f64>) {
    let mut rates: HashMap<String, f64> = ROLE_RATES
        .iter()
        .map(|(title, rate)| (title.to_string(), *rate))
        .collect();
    rates.extend(custom_rates.iter().map(|(k, v)| (k.clone(), *v)));

    let mut stack: Vec<&mut OrgNode> = tree.iter_mut().collect();
    while let Some(node) = stack.pop() {
        let rate = rates
            .get(&node.role_title)
            .or_else(|| rates.get("Analyst"))
            .copied()
            .unwrap_or(FALLBACK_RATE);
        node.annual_cost = (node.fte * rate).round();
        stack.extend(node.children.iter_mut());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    DuplicateId,
    ExcessiveDepth,
    InvalidFte,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub message: String,
    pub node_id: Option<String>,
}

pub fn validate_tree(tree: &[OrgNode]) -> Vec<ValidationIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    let mut stack: Vec<(&OrgNode, usize)> = tree.iter().rev().map(|root| (root, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            issues.push(ValidationIssue {
                issue_type: IssueType::DuplicateId,
                message: format!("Duplicate node ID found: {}", node.id),
                node_id: Some(node.id.clone()),
            });
        }
        if depth > MAX_DEPTH {
            issues.push(ValidationIssue {
                issue_type: IssueType::ExcessiveDepth,
                message: format!("Node at excessive depth ({}): {}", depth, node.role_title),
                node_id: Some(node.id.clone()),
            });
        }
        if node.fte <= 0.0 || node.fte > 2.0 {
            issues.push(ValidationIssue {
                issue_type: IssueType::InvalidFte,
                message: format!("Invalid FTE value ({}) for {}", node.fte, node.role_title),
                node_id: Some(node.id.clone()),
            });
        }
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    issues
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub name: String,
    pub total_fte: f64,
    pub total_cost: f64,
    pub position_count: usize,
    pub avg_span_of_control: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_vs_baseline: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    pub baseline: ScenarioSummary,
    pub moderate: ScenarioSummary,
    pub aggressive: ScenarioSummary,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn summarize(tree: &[OrgNode], name: &str) -> ScenarioSummary {
    let nodes = flatten(tree);
    let managers: Vec<&&OrgNode> = nodes.iter().filter(|n| !n.children.is_empty()).collect();
    let direct_reports: usize = managers.iter().map(|n| n.span_of_control()).sum();

    ScenarioSummary {
        name: name.to_string(),
        total_fte: round1(nodes.iter().map(|n| n.fte).sum()),
        total_cost: nodes.iter().map(|n| n.annual_cost).sum::<f64>().round(),
        position_count: nodes.len(),
        avg_span_of_control: if managers.is_empty() {
            0.0
        } else {
            round1(direct_reports as f64 / managers.len() as f64)
        },
        savings_vs_baseline: None,
        savings_percentage: None,
    }
}

/// 統制範囲の小さい管理職を下位から刈り込む
pub fn prune_by_span(tree: Vec<OrgNode>, min_span: usize, aggressive: bool) -> Vec<OrgNode> {
    fn prune(mut node: OrgNode, min_span: usize, aggressive: bool) -> Option<OrgNode> {
        if node.children.is_empty() {
            return Some(node);
        }

        node.children = std::mem::take(&mut node.children)
            .into_iter()
            .filter_map(|child| prune(child, min_span, aggressive))
            .collect();
        let span = node.children.len();

        if aggressive {
            if span < 2 && node.level > 0 {
                return None;
            }
            // 中間層が1人だけを束ねている場合は子で置き換える
            if span == 1 && !node.children[0].children.is_empty() {
                let mut child = node.children.remove(0);
                child.parent_id = node.parent_id.take();
                return Some(child);
            }
        }

        if span > 0 && span < min_span {
            return None;
        }
        Some(node)
    }

    tree.into_iter()
        .filter_map(|node| prune(node, min_span, aggressive))
        .collect()
}

fn with_savings(mut summary: ScenarioSummary, baseline: &ScenarioSummary) -> ScenarioSummary {
    let savings = baseline.total_cost - summary.total_cost;
    summary.savings_vs_baseline = Some(savings);
    summary.savings_percentage = Some(if baseline.total_cost == 0.0 {
        0.0
    } else {
        savings / baseline.total_cost * 100.0
    });
    summary
}

pub fn build_scenarios(tree: &[OrgNode]) -> Scenarios {
    let baseline = summarize(tree, "Baseline");
    let moderate = summarize(
        &prune_by_span(tree.to_vec(), 3, false),
        "Moderate Restructuring",
    );
    let aggressive = summarize(
        &prune_by_span(tree.to_vec(), 10, true),
        "Aggressive Restructuring",
    );

    Scenarios {
        moderate: with_savings(moderate, &baseline),
        aggressive: with_savings(aggressive, &baseline),
        baseline,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBuildResult {
    pub tree: Vec<OrgNode>,
    pub scenarios: Scenarios,
    pub issues: Vec<ValidationIssue>,
}

/// 構築 → 検証 → 見積 → シナリオの一連処理
///
/// 階層が [`MAX_HIERARCHY_DEPTH`] を超える入力は構築せずに拒否する。
pub fn build_chart(
    roles: &[RoleInput],
    custom_rates: &HashMap<String, f64>,
) -> Result<ChartBuildResult, ChartError> {
    let hierarchy = link(roles);
    let depth = hierarchy.depth();
    if depth > MAX_HIERARCHY_DEPTH {
        return Err(ChartError::TooDeep {
            depth,
            max: MAX_HIERARCHY_DEPTH,
        });
    }

    let mut tree = assemble(roles, &hierarchy);
    let issues = validate_tree(&tree);
    estimate_cost(&mut tree, custom_rates);
    let scenarios = build_scenarios(&tree);
    Ok(ChartBuildResult {
        tree,
        scenarios,
        issues,
    })
}

/// 表示用に子をコスト降順に並べ替える
pub fn optimize_layout(mut tree: Vec<OrgNode>) -> Vec<OrgNode> {
    let mut stack: Vec<&mut OrgNode> = tree.iter_mut().collect();
    while let Some(node) = stack.pop() {
        node.children
            .sort_by(|a, b| b.annual_cost.total_cmp(&a.annual_cost));
        stack.extend(node.children.iter_mut());
    }
    tree
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn svg_nodes(out: &mut String, nodes: &[OrgNode], center_x: f64, y: f64, total_width: f64) {
    if nodes.is_empty() {
        return;
    }
    let spacing = total_width / (nodes.len() as f64 + 1.0);

    for (index, node) in nodes.iter().enumerate() {
        let x = center_x + (index as f64 - (nodes.len() as f64 - 1.0) / 2.0) * spacing;

        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" class="org-node" rx="8"/>"#,
            x - NODE_WIDTH / 2.0,
            y - NODE_HEIGHT / 2.0,
            NODE_WIDTH,
            NODE_HEIGHT
        );
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" class="org-text">{}</text>"#,
            x,
            y - 5.0,
            escape_xml(&node.role_title)
        );
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" class="org-text" style="font-size: 10px;">FTE: {} | {}</text>"#,
            x,
            y + 15.0,
            node.fte,
            format_currency(node.annual_cost)
        );

        if !node.children.is_empty() {
            let _ = write!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="org-link"/>"#,
                x,
                y + NODE_HEIGHT / 2.0,
                x,
                y + VERTICAL_SPACING - NODE_HEIGHT / 2.0
            );
            let child_width = total_width.min(node.children.len() as f64 * 200.0);
            svg_nodes(out, &node.children, x, y + VERTICAL_SPACING, child_width);
        }
    }
}

pub fn to_svg(tree: &[OrgNode], width: u32) -> String {
    let width_f = f64::from(width);
    let height = (count_nodes(tree) as u32 * 80).max(400);

    let mut body = String::new();
    svg_nodes(&mut body, tree, 0.0, 0.0, width_f);

    format!(
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">{style}<g transform="translate({tx}, 40)">{body}</g></svg>"#,
        w = width,
        h = height,
        style = SVG_STYLE,
        tx = width_f / 2.0,
        body = body
    )
}

pub fn to_csv(tree: &[OrgNode]) -> String {
    let mut rows = vec!["Role Title,FTE,Annual Cost,Level,Parent ID".to_string()];
    for node in flatten(tree) {
        rows.push(format!(
            "\"{}\",{},{},{},{}",
            node.role_title.replace('"', "\"\""),
            node.fte,
            node.annual_cost,
            node.level,
            node.parent_id.as_deref().unwrap_or("")
        ));
    }
    rows.join("\n")
}

pub fn to_d3(tree: &[OrgNode]) -> Value {
    fn convert(node: &OrgNode) -> Value {
        let mut value = json!({
            "name": node.role_title,
            "id": node.id,
            "fte": node.fte,
            "cost": node.annual_cost,
            "data": {
                "id": node.id,
                "roleTitle": node.role_title,
                "fte": node.fte,
                "annualCost": node.annual_cost,
                "level": node.level,
            }
        });
        if !node.children.is_empty() {
            value["children"] = Value::Array(node.children.iter().map(convert).collect());
        }
        value
    }

    json!({
        "name": "Organization",
        "children": tree.iter().map(convert).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str, title: &str, parent: Option<&str>) -> RoleInput {
        RoleInput {
            id: id.to_string(),
            role_title: title.to_string(),
            fte: 1.0,
            annual_cost: None,
            parent_id: parent.map(str::to_string),
            level: None,
        }
    }

    fn sample_roles() -> Vec<RoleInput> {
        vec![
            role("ceo", "CEO", None),
            role("vp1", "VP", Some("ceo")),
            role("vp2", "VP", Some("ceo")),
            role("m1", "Manager", Some("vp1")),
            role("a1", "Analyst", Some("m1")),
            role("a2", "Analyst", Some("vp2")),
            role("a3", "Analyst", Some("vp2")),
        ]
    }

    #[test]
    fn test_build_tree_keeps_input_order_and_levels() {
        let tree = build_tree(&sample_roles());
        assert_eq!(tree.len(), 1);
        let ceo = &tree[0];
        assert_eq!(ceo.level, 0);
        let ids: Vec<_> = ceo.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["vp1", "vp2"]);
        assert_eq!(ceo.children[0].children[0].children[0].level, 3);
        assert_eq!(max_depth(&tree), 4);
    }

    #[test]
    fn test_cycles_and_dangling_parents_become_roots() {
        let roles = vec![
            role("a", "Manager", Some("b")),
            role("b", "Manager", Some("a")),
            role("c", "Analyst", Some("missing")),
            role("d", "Analyst", Some("d")),
        ];
        let tree = build_tree(&roles);
        let roots: Vec<_> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["b", "c", "d"]);
        assert_eq!(tree[0].children[0].id, "a");
        assert_eq!(count_nodes(&tree), 4);
    }

    #[test]
    fn test_estimate_cost_with_custom_rates() {
        let mut tree = build_tree(&[
            role("x", "Wizard", None),
            RoleInput {
                fte: 0.5,
                ..role("y", "Manager", Some("x"))
            },
        ]);
        let custom = HashMap::from([("Analyst".to_string(), 70000.0)]);
        estimate_cost(&mut tree, &custom);
        // 未知の役職は Analyst の単価
        assert_eq!(tree[0].annual_cost, 70000.0);
        assert_eq!(tree[0].children[0].annual_cost, 47500.0);
    }

    #[test]
    fn test_validate_tree_issues() {
        let mut roles = sample_roles();
        roles.push(role("ceo", "CEO", None));
        roles[1].fte = 2.5;
        let issues = validate_tree(&build_tree(&roles));
        let types: Vec<_> = issues.iter().map(|i| i.issue_type).collect();
        assert!(types.contains(&IssueType::DuplicateId));
        assert!(types.contains(&IssueType::InvalidFte));
        assert!(issues
            .iter()
            .any(|i| i.message == "Invalid FTE value (2.5) for VP"));
    }

    #[test]
    fn test_excessive_depth() {
        let mut roles = vec![role("n0", "Lead", None)];
        for i in 1..=11 {
            roles.push(role(&format!("n{i}"), "Lead", Some(&format!("n{}", i - 1))));
        }
        let issues = validate_tree(&build_tree(&roles));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Node at excessive depth (11): Lead");
    }

    #[test]
    fn test_summarize() {
        let mut tree = build_tree(&sample_roles());
        estimate_cost(&mut tree, &HashMap::new());
        let summary = summarize(&tree, "Baseline");
        assert_eq!(summary.position_count, 7);
        assert_eq!(summary.total_fte, 7.0);
        assert_eq!(summary.total_cost, 300000.0 + 360000.0 + 95000.0 + 195000.0);
        // ceo 2, vp1 1, m1 1, vp2 2 → 6 / 4
        assert_eq!(summary.avg_span_of_control, 1.5);
    }

    #[test]
    fn test_moderate_pruning_removes_small_spans() {
        let roles = vec![
            role("root", "CEO", None),
            role("vp1", "VP", Some("root")),
            role("m1", "Manager", Some("vp1")),
            role("vp2", "VP", Some("root")),
            role("vp3", "VP", Some("root")),
            role("vp4", "VP", Some("root")),
        ];
        let pruned = prune_by_span(build_tree(&roles), 3, false);
        // vp1 (span 1) は配下ごと削除され、root は span 3 で残る
        assert_eq!(count_nodes(&pruned), 4);
        let ids: Vec<_> = pruned[0].children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["vp2", "vp3", "vp4"]);
    }

    #[test]
    fn test_pruning_can_remove_root() {
        let pruned = prune_by_span(build_tree(&sample_roles()), 3, false);
        assert!(pruned.is_empty());
    }

    #[test]
    fn test_aggressive_pruning_promotes_single_chain() {
        let roles = vec![
            role("root", "CEO", None),
            role("mid", "VP", Some("root")),
            role("leaf1", "Analyst", Some("mid")),
            role("leaf2", "Analyst", Some("mid")),
        ];
        let pruned = prune_by_span(build_tree(&roles), 1, true);
        // root は span 1 で孫を持つので mid に置き換わる
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, "mid");
        assert_eq!(pruned[0].parent_id, None);
        assert_eq!(pruned[0].children.len(), 2);
    }

    #[test]
    fn test_build_scenarios_reports_savings() {
        let result = build_chart(&sample_roles(), &HashMap::new()).unwrap();
        let scenarios = &result.scenarios;
        assert_eq!(scenarios.baseline.name, "Baseline");
        assert!(scenarios.baseline.savings_vs_baseline.is_none());
        let moderate_savings = scenarios.moderate.savings_vs_baseline.unwrap_or_default();
        assert!(moderate_savings > 0.0);
        assert!(scenarios.aggressive.savings_percentage.unwrap_or_default() > 0.0);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_baseline_has_zero_percentage() {
        let scenarios = build_scenarios(&[]);
        assert_eq!(scenarios.moderate.savings_percentage, Some(0.0));
    }

    #[test]
    fn test_svg_height_and_escaping() {
        let mut tree = build_tree(&[role("r", "R&D <Lead>", None)]);
        estimate_cost(&mut tree, &HashMap::new());
        let svg = to_svg(&tree, 1200);
        assert!(svg.starts_with(r#"<svg width="1200" height="400""#));
        assert!(svg.contains("R&amp;D &lt;Lead&gt;"));
        assert!(svg.contains("FTE: 1 | $65,000"));
        assert!(svg.contains("<defs><style>.org-node { fill: #3b82f6;"));
        assert!(svg.ends_with("</g></svg>"));

        let many: Vec<_> = (0..6).map(|i| role(&i.to_string(), "Analyst", None)).collect();
        assert!(to_svg(&build_tree(&many), 800).contains(r#"height="480""#));
    }

    #[test]
    fn test_csv_is_pre_order() {
        let mut tree = build_tree(&sample_roles());
        estimate_cost(&mut tree, &HashMap::new());
        let csv = to_csv(&tree);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Role Title,FTE,Annual Cost,Level,Parent ID");
        assert_eq!(lines[1], "\"CEO\",1,300000,0,");
        assert_eq!(lines[2], "\"VP\",1,180000,1,ceo");
        assert_eq!(lines[3], "\"Manager\",1,95000,2,vp1");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_d3_and_layout() {
        let mut tree = build_tree(&sample_roles());
        estimate_cost(&mut tree, &HashMap::new());
        let tree = optimize_layout(tree);
        let d3 = to_d3(&tree);
        assert_eq!(d3["name"], "Organization");
        assert_eq!(d3["children"][0]["name"], "CEO");
        assert!(d3["children"][0]["children"][0]["data"]["annualCost"].is_number());
        assert!(d3["children"][0]["children"][0]["children"][0].get("children").is_some());
        assert!(d3["children"][0]["children"][1]["children"][0].get("children").is_none());
    }

    fn chain(len: usize) -> Vec<RoleInput> {
        let mut roles = vec![role("n0", "Director", None)];
        for i in 1..len {
            roles.push(role(&format!("n{i}"), "Manager", Some(&format!("n{}", i - 1))));
        }
        roles
    }

    #[test]
    fn test_deep_chain_is_rejected_before_building() {
        // 階層の計算はノード数に比例し、木は組み立てない
        let roles = chain(20_000);
        assert_eq!(hierarchy_depth(&roles), 20_000);
        assert_eq!(
            build_chart(&roles, &HashMap::new()),
            Err(ChartError::TooDeep {
                depth: 20_000,
                max: MAX_HIERARCHY_DEPTH
            })
        );
    }

    #[test]
    fn test_chain_at_depth_limit_is_built() {
        let result = build_chart(&chain(MAX_HIERARCHY_DEPTH), &HashMap::new()).unwrap();
        assert_eq!(max_depth(&result.tree), MAX_HIERARCHY_DEPTH);
        assert_eq!(count_nodes(&result.tree), MAX_HIERARCHY_DEPTH);
        assert_eq!(flatten(&result.tree).last().map(|n| n.level), Some(49));

        assert!(build_chart(&chain(MAX_HIERARCHY_DEPTH + 1), &HashMap::new()).is_err());
    }

    #[test]
    fn test_reversed_chain_links_every_node() {
        // 親が後に現れる場合も循環判定は同じ結果になる
        let mut roles = chain(30);
        roles.reverse();
        let tree = build_tree(&roles);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, "n0");
        assert_eq!(max_depth(&tree), 30);
    }
}
