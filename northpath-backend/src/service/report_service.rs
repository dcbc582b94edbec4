// northpath-backend/src/service/report_service.rs

//! 診断結果のレポート生成 (HTML / JSON)。
//! 掲載内容の深さはティアのレポートページ数で決まる。

use crate::domain::assessment_model::Model as Assessment;
use crate::domain::pricing_tier::PricingTier;
use crate::engine::cost::{
    cost_savings_recommendations, detailed_cost_analysis, format_currency, format_percentage,
    CostPosition,
};
use crate::error::{AppError, AppResult};
use crate::service::assessment_service::AssessmentService;
use crate::service::collaboration_service::Actor;
use crate::utils::validation::escape_html;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// この値未満のセクションは改善提案の対象
const WEAK_SECTION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Invalid report format: {}", s)),
        }
    }
}

/// ティアのレポートページ数から決まる掲載範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDepth {
    /// 総合スコアとセクション別スコア
    Summary,
    /// + 実行アルゴリズムと改善提案
    Standard,
    /// + コスト分析と成果物一覧
    Comprehensive,
}

impl ReportDepth {
    pub fn for_pages(pages: u32) -> Self {
        match pages {
            0..=15 => ReportDepth::Summary,
            16..=30 => ReportDepth::Standard,
            _ => ReportDepth::Comprehensive,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub assessment_id: Uuid,
    pub format: ReportFormat,
    pub title: Option<String>,
    pub cost_positions: Vec<CostPosition>,
    pub redundancy_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScore {
    pub name: String,
    pub score: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSection {
    pub total_position_cost: String,
    pub conservative_savings: String,
    pub moderate_savings: String,
    pub aggressive_savings: String,
    pub redundancy: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub assessment_id: Uuid,
    pub title: String,
    pub institution_name: String,
    pub tier: String,
    pub tier_name: String,
    pub depth: ReportDepth,
    pub page_budget: u32,
    pub overall_score: Option<f64>,
    pub section_scores: Vec<SectionScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub algorithms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_analysis: Option<CostSection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ReportOutput {
    Html { filename: String, body: String },
    Json(Box<ReportDocument>),
}

fn results_of(assessment: &Assessment) -> Option<&Value> {
    assessment.analysis_results.as_ref().map(|stored| {
        stored
            .get("results")
            .filter(|v| v.is_object())
            .unwrap_or(stored)
    })
}

/// 0..1 の値を 0..100 に揃える
fn as_percent(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

fn numeric_entries(value: Option<&Value>) -> Vec<(String, f64)> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}

pub fn overall_score(results: &Value) -> Option<f64> {
    results
        .pointer("/airix/overallReadiness")
        .or_else(|| results.pointer("/score/score"))
        .and_then(Value::as_f64)
        .map(as_percent)
}

/// AIRIX のドメイン別スコア、なければ v2.1 のセクション別スコア
pub fn section_scores(results: &Value) -> Vec<SectionScore> {
    let mut entries = numeric_entries(results.pointer("/airix/domainScores"));
    if entries.is_empty() {
        entries = numeric_entries(results.pointer("/score/sectionScores"));
    }
    entries
        .into_iter()
        .map(|(name, raw)| {
            let score = as_percent(raw);
            SectionScore {
                display: format_percentage(score, 1),
                name,
                score,
            }
        })
        .collect()
}

pub fn recommendations(results: &Value, sections: &[SectionScore]) -> Vec<String> {
    let from_engine: Vec<String> = results
        .pointer("/airix/recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    if !from_engine.is_empty() {
        return from_engine;
    }

    let mut weak: Vec<&SectionScore> = sections
        .iter()
        .filter(|s| s.score < WEAK_SECTION_THRESHOLD * 100.0)
        .collect();
    weak.sort_by(|a, b| a.score.total_cmp(&b.score));
    if weak.is_empty() {
        return vec![
            "Maintain current practices and schedule a follow-up assessment to track progress."
                .to_string(),
        ];
    }
    weak.into_iter()
        .map(|s| {
            format!(
                "Prioritize improvements in {} (currently {}).",
                s.name, s.display
            )
        })
        .collect()
}

pub fn cost_section(positions: &[CostPosition], redundancy_pct: f64) -> Option<CostSection> {
    if positions.is_empty() {
        return None;
    }
    let analysis = detailed_cost_analysis(positions, redundancy_pct);
    Some(CostSection {
        total_position_cost: format_currency(analysis.total_position_cost),
        conservative_savings: format_currency(analysis.savings.conservative),
        moderate_savings: format_currency(analysis.savings.moderate),
        aggressive_savings: format_currency(analysis.savings.aggressive),
        redundancy: format_percentage(redundancy_pct * 100.0, 1),
        recommendations: cost_savings_recommendations(&analysis),
    })
}

/// 保存済みの分析結果からレポート本体を組み立てる
pub fn build_report(
    assessment: &Assessment,
    tier: PricingTier,
    request: &ReportRequest,
    now: DateTime<Utc>,
) -> AppResult<ReportDocument> {
    let results = results_of(assessment).ok_or_else(|| {
        AppError::BadRequest("Assessment has not been analyzed yet".to_string())
    })?;

    let config = tier.config();
    let depth = ReportDepth::for_pages(config.assessment_scope.report_pages);
    let sections = section_scores(results);

    let mut document = ReportDocument {
        assessment_id: assessment.id,
        title: request
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{} Report", config.name)),
        institution_name: assessment
            .institution_name
            .clone()
            .unwrap_or_else(|| "Anonymous Institution".to_string()),
        tier: tier.to_string(),
        tier_name: config.name.to_string(),
        depth,
        page_budget: config.assessment_scope.report_pages,
        overall_score: overall_score(results),
        section_scores: sections,
        algorithms: Vec::new(),
        recommendations: Vec::new(),
        cost_analysis: None,
        deliverables: Vec::new(),
        generated_at: now,
    };

    if depth >= ReportDepth::Standard {
        document.algorithms = results
            .get("algorithms")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        document.recommendations = recommendations(results, &document.section_scores);
    }

    if depth == ReportDepth::Comprehensive {
        document.cost_analysis = cost_section(
            &request.cost_positions,
            request.redundancy_pct.unwrap_or(0.15).clamp(0.0, 1.0),
        );
        document.deliverables = config
            .core_deliverables
            .iter()
            .map(|d| d.to_string())
            .collect();
    }

    Ok(document)
}

pub fn render_html(doc: &ReportDocument) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\
         <h1>{title}</h1><p>{institution} &middot; {tier}</p><p>Generated {date}</p>",
        title = escape_html(&doc.title),
        institution = escape_html(&doc.institution_name),
        tier = escape_html(&doc.tier_name),
        date = doc.generated_at.format("%B %-d, %Y"),
    );

    if let Some(score) = doc.overall_score {
        let _ = write!(
            html,
            "<h2>Overall Score</h2><p class=\"score\">{}</p>",
            format_percentage(score, 1)
        );
    }

    if !doc.section_scores.is_empty() {
        html.push_str("<h2>Section Scores</h2><table><tr><th>Section</th><th>Score</th></tr>");
        for section in &doc.section_scores {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&section.name),
                section.display
            );
        }
        html.push_str("</table>");
    }

    let list = |html: &mut String, heading: &str, items: &[String]| {
        if items.is_empty() {
            return;
        }
        let _ = write!(html, "<h2>{}</h2><ul>", heading);
        for item in items {
            let _ = write!(html, "<li>{}</li>", escape_html(item));
        }
        html.push_str("</ul>");
    };
    list(&mut html, "Algorithms Applied", &doc.algorithms);
    list(&mut html, "Recommendations", &doc.recommendations);

    if let Some(cost) = &doc.cost_analysis {
        let _ = write!(
            html,
            "<h2>Cost Analysis</h2><table>\
             <tr><td>Total position cost</td><td>{}</td></tr>\
             <tr><td>Redundancy</td><td>{}</td></tr>\
             <tr><td>Conservative savings</td><td>{}</td></tr>\
             <tr><td>Moderate savings</td><td>{}</td></tr>\
             <tr><td>Aggressive savings</td><td>{}</td></tr></table>",
            cost.total_position_cost,
            cost.redundancy,
            cost.conservative_savings,
            cost.moderate_savings,
            cost.aggressive_savings,
        );
        list(&mut html, "Cost Recommendations", &cost.recommendations);
    }
    list(&mut html, "Deliverables", &doc.deliverables);

    html.push_str("</body></html>");
    html
}

pub struct ReportService {
    assessment_service: Arc<AssessmentService>,
}

impl ReportService {
    pub fn new(assessment_service: Arc<AssessmentService>) -> Self {
        Self { assessment_service }
    }

    pub async fn generate(&self, request: ReportRequest, actor: &Actor) -> AppResult<ReportOutput> {
        let assessment = self
            .assessment_service
            .get_for_user(
                request.assessment_id,
                actor.user_id,
                &actor.email,
                actor.is_admin,
            )
            .await?;
        let tier = assessment.pricing_tier().ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Assessment {} has unknown tier {}",
                assessment.id, assessment.tier
            ))
        })?;

        let document = build_report(&assessment, tier, &request, Utc::now())?;
        info!(
            assessment_id = %assessment.id,
            tier = %tier,
            depth = ?document.depth,
            "Report generated"
        );

        Ok(match request.format {
            ReportFormat::Json => ReportOutput::Json(Box::new(document)),
            ReportFormat::Html => ReportOutput::Html {
                filename: format!("northpath-report-{}.html", assessment.id),
                body: render_html(&document),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assessment(tier: PricingTier, results: Option<Value>) -> Assessment {
        Assessment {
            id: Uuid::new_v4(),
            user_id: None,
            tier: tier.to_string(),
            assessment_type: tier.assessment_type().to_string(),
            organization_type: "higher-education".to_string(),
            institution_name: Some("River <College>".to_string()),
            contact_email: None,
            contact_name: None,
            responses: json!({}),
            uploaded_files: json!([]),
            status: "COMPLETED".to_string(),
            analysis_results: results.map(|r| json!({"results": r, "algorithmsRun": ["V21"]})),
            ai_readiness_score: None,
            submitted_at: None,
            subscription_status: None,
            subscription_expires_at: None,
            last_payment_date: None,
            stripe_session_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn organizational_results() -> Value {
        json!({
            "score": {"score": 0.62, "sectionScores": {"Governance": 0.8, "Technology": 0.35}},
            "algorithms": ["V21", "DSCH"]
        })
    }

    #[test]
    fn test_depth_follows_report_pages() {
        assert_eq!(ReportDepth::for_pages(10), ReportDepth::Summary);
        assert_eq!(ReportDepth::for_pages(15), ReportDepth::Summary);
        assert_eq!(ReportDepth::for_pages(25), ReportDepth::Standard);
        assert_eq!(ReportDepth::for_pages(50), ReportDepth::Comprehensive);
    }

    #[test]
    fn test_unanalyzed_assessment_is_rejected() {
        let a = assessment(PricingTier::OneTimeDiagnostic, None);
        let request = ReportRequest::default();
        assert!(matches!(
            build_report(&a, PricingTier::OneTimeDiagnostic, &request, Utc::now()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_summary_report_omits_recommendations() {
        let a = assessment(PricingTier::OneTimeDiagnostic, Some(organizational_results()));
        let doc = build_report(
            &a,
            PricingTier::OneTimeDiagnostic,
            &ReportRequest::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(doc.depth, ReportDepth::Summary);
        assert!((doc.overall_score.unwrap() - 62.0).abs() < 1e-9);
        assert_eq!(doc.section_scores.len(), 2);
        assert!(doc.recommendations.is_empty());
        assert!(doc.algorithms.is_empty());
    }

    #[test]
    fn test_comprehensive_report_includes_cost_and_weak_sections() {
        let tier = PricingTier::EnterpriseTransformation;
        let a = assessment(tier, Some(organizational_results()));
        let request = ReportRequest {
            cost_positions: vec![CostPosition {
                id: "p1".to_string(),
                title: "Coordinator".to_string(),
                department: "Admissions".to_string(),
                total_cost: 100_000.0,
                fte: 1.0,
                benefits: None,
                overhead: None,
            }],
            redundancy_pct: Some(0.5),
            ..Default::default()
        };
        let doc = build_report(&a, tier, &request, Utc::now()).unwrap();
        assert_eq!(doc.depth, ReportDepth::Comprehensive);
        assert_eq!(doc.algorithms, vec!["V21", "DSCH"]);
        assert_eq!(doc.recommendations.len(), 1);
        assert!(doc.recommendations[0].contains("Technology"));

        let cost = doc.cost_analysis.as_ref().unwrap();
        assert_eq!(cost.total_position_cost, "$100,000");
        assert_eq!(cost.aggressive_savings, "$50,000");
        assert_eq!(cost.moderate_savings, "$40,000");
        assert!(!doc.deliverables.is_empty());
    }

    #[test]
    fn test_ai_report_uses_engine_recommendations() {
        let tier = PricingTier::AiReadinessComprehensive;
        let results = json!({
            "airix": {
                "overallReadiness": 71.5,
                "domainScores": {"strategic": 80.0, "governance": 63.0},
                "recommendations": ["Form an AI governance committee"]
            },
            "algorithms": ["AIRIX", "AIRS", "AICS"]
        });
        let a = assessment(tier, Some(results));
        let doc = build_report(&a, tier, &ReportRequest::default(), Utc::now()).unwrap();
        assert_eq!(doc.overall_score, Some(71.5));
        assert_eq!(doc.recommendations, vec!["Form an AI governance committee"]);
        assert!(doc.cost_analysis.is_none());
    }

    #[test]
    fn test_html_is_escaped() {
        let a = assessment(PricingTier::OneTimeDiagnostic, Some(organizational_results()));
        let doc = build_report(
            &a,
            PricingTier::OneTimeDiagnostic,
            &ReportRequest::default(),
            Utc::now(),
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("River &lt;College&gt;"));
        assert!(html.contains("<h2>Section Scores</h2>"));
        assert!(html.ends_with("</body></html>"));
    }
}
