// northpath-backend/src/service/chart_service.rs

use crate::db::DbPool;
use crate::domain::org_chart_model::Model as OrgChart;
use crate::engine::org_chart::{
    build_chart, count_nodes, max_depth, optimize_layout, to_csv, to_d3, to_svg, ChartBuildResult,
    RoleInput, Scenarios, ValidationIssue,
};
use crate::error::{AppError, AppResult};
use crate::repository::org_chart_repository::{NewOrgChart, OrgChartRepository};
use crate::service::assessment_service::AssessmentService;
use crate::service::collaboration_service::Actor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_SVG_WIDTH: u32 = 1200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Json,
    Svg,
    Csv,
}

impl ChartFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ChartFormat::Json => "application/json",
            ChartFormat::Svg => "image/svg+xml",
            ChartFormat::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Json => "json",
            ChartFormat::Svg => "svg",
            ChartFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ChartFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ChartFormat::Json),
            "svg" => Ok(ChartFormat::Svg),
            "csv" => Ok(ChartFormat::Csv),
            _ => Err(format!("Invalid chart format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub assessment_id: Option<Uuid>,
    pub name: Option<String>,
    pub roles: Vec<RoleInput>,
    pub custom_rates: HashMap<String, f64>,
    pub format: ChartFormat,
    pub save_to_database: bool,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetrics {
    pub total_positions: usize,
    pub max_depth: usize,
    pub issue_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDocument {
    pub chart: Value,
    pub scenarios: Scenarios,
    pub issues: Vec<ValidationIssue>,
    pub metrics: ChartMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<Uuid>,
}

/// 生成結果。SVG/CSV はファイルとして返す
#[derive(Debug, Clone)]
pub enum ChartOutput {
    Document(Box<ChartDocument>),
    File {
        format: ChartFormat,
        filename: String,
        body: String,
    },
}

/// 出力用の整形 (保存とは独立)
pub fn render_chart(
    result: ChartBuildResult,
    format: ChartFormat,
    width: u32,
    name: &str,
    chart_id: Option<Uuid>,
) -> ChartOutput {
    let tree = optimize_layout(result.tree);
    let filename = format!("{}.{}", slug(name), format.extension());

    match format {
        ChartFormat::Svg => ChartOutput::File {
            format,
            filename,
            body: to_svg(&tree, width),
        },
        ChartFormat::Csv => ChartOutput::File {
            format,
            filename,
            body: to_csv(&tree),
        },
        ChartFormat::Json => ChartOutput::Document(Box::new(ChartDocument {
            chart: to_d3(&tree),
            metrics: ChartMetrics {
                total_positions: count_nodes(&tree),
                max_depth: max_depth(&tree),
                issue_count: result.issues.len(),
            },
            scenarios: result.scenarios,
            issues: result.issues,
            chart_id,
        })),
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "org-chart".to_string()
    } else {
        slug.to_string()
    }
}

pub struct ChartService {
    assessment_service: Arc<AssessmentService>,
    chart_repo: OrgChartRepository,
}

impl ChartService {
    pub fn new(db: DbPool, assessment_service: Arc<AssessmentService>) -> Self {
        Self {
            assessment_service,
            chart_repo: OrgChartRepository::new(db),
        }
    }

    /// 組織図は紐付く診断を参照できる利用者のみ扱える
    async fn ensure_access(&self, assessment_id: Uuid, actor: &Actor) -> AppResult<()> {
        self.assessment_service
            .get_for_user(assessment_id, actor.user_id, &actor.email, actor.is_admin)
            .await?;
        Ok(())
    }

    pub async fn generate(&self, request: ChartRequest, actor: &Actor) -> AppResult<ChartOutput> {
        if request.roles.is_empty() {
            return Err(AppError::BadRequest("Roles are required".to_string()));
        }

        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Organization Chart".to_string());
        let width = request.width.unwrap_or(DEFAULT_SVG_WIDTH);
        let result = build_chart(&request.roles, &request.custom_rates)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let chart_id = if request.save_to_database {
            let assessment_id = request.assessment_id.ok_or_else(|| {
                AppError::BadRequest("assessmentId is required to save the chart".to_string())
            })?;
            self.ensure_access(assessment_id, actor).await?;

            let saved = self
                .chart_repo
                .create(NewOrgChart {
                    assessment_id,
                    name: name.clone(),
                    svg_content: Some(to_svg(&result.tree, width)),
                    roles: json!(request.roles),
                    scenarios: json!(result.scenarios),
                    issues: json!(result.issues),
                })
                .await?;
            info!(chart_id = %saved.id, assessment_id = %assessment_id, "Org chart saved");
            Some(saved.id)
        } else {
            None
        };

        Ok(render_chart(result, request.format, width, &name, chart_id))
    }

    pub async fn latest_for_assessment(
        &self,
        assessment_id: Uuid,
        actor: &Actor,
    ) -> AppResult<OrgChart> {
        self.ensure_access(assessment_id, actor).await?;
        self.chart_repo
            .find_latest_by_assessment(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Org chart not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> Vec<RoleInput> {
        vec![
            RoleInput {
                id: "1".to_string(),
                role_title: "President".to_string(),
                fte: 1.0,
                annual_cost: None,
                parent_id: None,
                level: None,
            },
            RoleInput {
                id: "2".to_string(),
                role_title: "Director".to_string(),
                fte: 1.0,
                annual_cost: None,
                parent_id: Some("1".to_string()),
                level: None,
            },
        ]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("SVG".parse::<ChartFormat>(), Ok(ChartFormat::Svg));
        assert!("pdf".parse::<ChartFormat>().is_err());
        assert_eq!(ChartFormat::Csv.content_type(), "text/csv");
    }

    #[test]
    fn test_render_json_document() {
        let result = build_chart(&roles(), &HashMap::new()).unwrap();
        match render_chart(result, ChartFormat::Json, 1200, "Campus", None) {
            ChartOutput::Document(doc) => {
                assert_eq!(doc.metrics.total_positions, 2);
                assert_eq!(doc.metrics.max_depth, 2);
                assert_eq!(doc.chart["name"], "Organization");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_render_csv_file() {
        let result = build_chart(&roles(), &HashMap::new()).unwrap();
        match render_chart(result, ChartFormat::Csv, 1200, "Main Campus!", None) {
            ChartOutput::File { filename, body, .. } => {
                assert_eq!(filename, "main-campus.csv");
                assert!(body.starts_with("Role Title,FTE,Annual Cost,Level,Parent ID"));
                assert_eq!(body.lines().count(), 3);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }
}
