// northpath-backend/src/service/analysis_service.rs

//! 提出された回答をエンジン入力に変換し、ティアのアルゴリズムを実行する

use crate::domain::pricing_tier::PricingTier;
use crate::engine::ai_readiness::{calculate_aics, calculate_airix, calculate_airs, AirixMetrics};
use crate::engine::dsch;
use crate::engine::question_filter::{Question, QUESTION_BANK};
use crate::engine::response::{AssessmentResponse, OrganizationProfile, ResponseValue};
use crate::engine::scoring::{score_v21, Segment};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

/// v2.1 スコアリングの回答上限 (0 = 未回答, 1..4)
const MAX_ANSWER: f64 = 4.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAnalysis {
    pub results: Value,
    pub ai_readiness_score: Option<f64>,
    pub algorithms_run: Vec<&'static str>,
    #[serde(skip)]
    pub airix: Option<AirixMetrics>,
}

fn question_index() -> HashMap<&'static str, &'static Question> {
    QUESTION_BANK
        .ai_readiness
        .iter()
        .chain(QUESTION_BANK.organizational.iter())
        .map(|q| (q.id.as_str(), q))
        .collect()
}

fn to_response_value(value: &Value) -> Option<ResponseValue> {
    match value {
        Value::Number(n) => n.as_f64().map(ResponseValue::Number),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Some(ResponseValue::Number(n)),
            Err(_) if s.trim().is_empty() => None,
            Err(_) => Some(ResponseValue::Text(s.clone())),
        },
        Value::Bool(b) => Some(ResponseValue::Number(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

/// 保存形式 (`{questionId: value}` または回答オブジェクトの配列) を回答一覧に変換する。
/// 設問バンクにある ID はセクション・ドメイン・設問文を補う
pub fn parse_responses(raw: &Value) -> Vec<AssessmentResponse> {
    let index = question_index();
    let enrich = |mut response: AssessmentResponse| {
        if let Some(question) = index.get(response.question_id.as_str()) {
            response.section.get_or_insert_with(|| question.section.clone());
            response.domain.get_or_insert_with(|| question.domain.clone());
            response
                .question
                .get_or_insert_with(|| question.question.clone());
            if response.topic.is_none() {
                response.topic = question.topic.clone();
            }
        }
        response
    };

    match raw {
        Value::Object(map) => map
            .iter()
            .map(|(id, value)| {
                enrich(AssessmentResponse {
                    question_id: id.clone(),
                    value: to_response_value(value),
                    ..Default::default()
                })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<AssessmentResponse>(item.clone()).ok())
            .map(enrich)
            .collect(),
        _ => Vec::new(),
    }
}

/// v2.1 スコアリング用の回答マップ。キーは `セクション:設問ID` で因子分類に使う
pub fn answers_map(responses: &[AssessmentResponse]) -> BTreeMap<String, f64> {
    responses
        .iter()
        .filter_map(|r| {
            let value = r.value.as_ref()?.as_number()?;
            let key = match &r.section {
                Some(section) => format!("{}:{}", section, r.question_id),
                None => r.question_id.clone(),
            };
            Some((key, value.clamp(0.0, MAX_ANSWER)))
        })
        .collect()
}

pub fn organization_profile(organization_type: &str) -> OrganizationProfile {
    OrganizationProfile {
        institution_type: Some(organization_type.to_string()),
        ..Default::default()
    }
}

/// ティアで利用可能なアルゴリズムのうち、実装済みのものを実行する
pub fn run_tier_analysis(tier: PricingTier, organization_type: &str, raw: &Value) -> TierAnalysis {
    let responses = parse_responses(raw);
    let profile = organization_profile(organization_type);
    let available = tier.available_algorithms();
    let mut results = Map::new();
    let mut algorithms_run = Vec::new();
    let mut ai_readiness_score = None;
    let mut airix_metrics = None;

    if tier.is_ai_tier() {
        let airix = calculate_airix(&responses, &profile);
        ai_readiness_score = Some(airix.overall_readiness);
        results.insert("airix".to_string(), json!(airix));
        algorithms_run.push("AIRIX");
        airix_metrics = Some(airix);

        if available.contains(&"AIRS") {
            results.insert("airs".to_string(), json!(calculate_airs(&responses, &profile)));
            algorithms_run.push("AIRS");
        }
        if available.contains(&"AICS") {
            results.insert("aics".to_string(), json!(calculate_aics(&responses, &profile)));
            algorithms_run.push("AICS");
        }
    } else {
        let segment = Segment::from_organization_type(organization_type);
        let score = score_v21(&answers_map(&responses), segment);
        results.insert("score".to_string(), json!(score));
        results.insert("segment".to_string(), json!(segment.to_string()));
        algorithms_run.push("V21");

        if available.contains(&"DSCH") {
            results.insert("dsch".to_string(), json!(dsch::calculate(&responses, &profile)));
            algorithms_run.push("DSCH");
        }
    }

    results.insert("responseCount".to_string(), json!(responses.len()));
    results.insert("algorithms".to_string(), json!(algorithms_run));

    TierAnalysis {
        results: Value::Object(results),
        ai_readiness_score,
        algorithms_run,
        airix: airix_metrics,
    }
}
