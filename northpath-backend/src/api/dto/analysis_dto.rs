// northpath-backend/src/api/dto/analysis_dto.rs

use crate::engine::cost::{
    format_currency, CostPosition, DetailedCostAnalysis, RoiTimeline, SavingsBands,
};
use crate::engine::response::OrganizationProfile;
use crate::engine::scoring::{SectionAnswer, Segment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// v2.1 スコアリング。`answers` がなければ旧形式の `responses` をセクション集計する
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub answers: Option<BTreeMap<String, f64>>,
    pub responses: Option<Vec<SectionAnswer>>,
    pub segment: Option<Segment>,
    pub organization_type: Option<String>,
}

impl ScoreRequest {
    pub fn segment(&self) -> Segment {
        self.segment.unwrap_or_else(|| {
            Segment::from_organization_type(self.organization_type.as_deref().unwrap_or_default())
        })
    }
}

/// DSCH / AI準備度の入力。回答は提出時と同じ形式
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsesRequest {
    pub responses: Value,
    pub organization_type: Option<String>,
    pub organization_profile: Option<OrganizationProfile>,
    /// AIRIX / AIRS / AICS のうち実行するもの (未指定は全て)
    pub algorithms: Option<Vec<String>>,
}

impl ResponsesRequest {
    pub fn wants(&self, algorithm: &str) -> bool {
        self.algorithms
            .as_ref()
            .map_or(true, |list| list.iter().any(|a| a.eq_ignore_ascii_case(algorithm)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReadinessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airix: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aics: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CostSavingsRequest {
    #[validate(length(min = 1, message = "At least one position is required"))]
    pub positions: Vec<CostPosition>,

    #[validate(range(min = 0.0, max = 1.0, message = "Redundancy must be between 0 and 1"))]
    pub redundancy_pct: f64,

    #[validate(range(min = 0.0, message = "Implementation cost cannot be negative"))]
    pub implementation_cost: Option<f64>,

    #[validate(range(min = 0.0, max = 1.0, message = "Confidence must be between 0 and 1"))]
    pub confidence: Option<f64>,

    pub redundancy_by_department: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedSavings {
    pub conservative: String,
    pub moderate: String,
    pub aggressive: String,
}

impl From<&SavingsBands> for FormattedSavings {
    fn from(savings: &SavingsBands) -> Self {
        Self {
            conservative: format_currency(savings.conservative),
            moderate: format_currency(savings.moderate),
            aggressive: format_currency(savings.aggressive),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSavingsResponse {
    pub analysis: DetailedCostAnalysis,
    pub formatted: FormattedSavings,
    pub redundancy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_timeline: Option<RoiTimeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_adjusted: Option<SavingsBands>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departments: Option<BTreeMap<String, SavingsBands>>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BenchmarkRequest {
    #[validate(length(min = 1, message = "Scores are required"))]
    pub scores: BTreeMap<String, f64>,

    #[validate(length(min = 1, message = "Benchmarks are required"))]
    pub benchmarks: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_falls_back_to_organization_type() {
        let request: ScoreRequest =
            serde_json::from_value(json!({"answers": {}, "organizationType": "community college"}))
                .unwrap();
        assert_eq!(request.segment(), Segment::HigherEd);

        let request: ScoreRequest =
            serde_json::from_value(json!({"answers": {}, "segment": "GOVERNMENT"})).unwrap();
        assert_eq!(request.segment(), Segment::Government);
    }

    #[test]
    fn test_algorithm_selection() {
        let all: ResponsesRequest = serde_json::from_value(json!({"responses": {}})).unwrap();
        assert!(all.wants("AIRS"));

        let only: ResponsesRequest =
            serde_json::from_value(json!({"responses": {}, "algorithms": ["airix"]})).unwrap();
        assert!(only.wants("AIRIX"));
        assert!(!only.wants("AICS"));
    }

    #[test]
    fn test_cost_request_validation() {
        let request: CostSavingsRequest = serde_json::from_value(json!({
            "positions": [],
            "redundancyPct": 1.5
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("positions"));
        assert!(fields.contains_key("redundancy_pct"));
    }
}
