// northpath-backend/src/engine/response.rs

use serde::{Deserialize, Serialize};

/// 回答値 (数値スケールまたは自由記述)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Number(f64),
    Text(String),
}

impl ResponseValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResponseValue::Number(n) => Some(*n),
            ResponseValue::Text(_) => None,
        }
    }
}

/// 設問1件分の回答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    #[serde(default)]
    pub question_id: String,
    /// 設問文
    #[serde(default, alias = "prompt")]
    pub question: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub value: Option<ResponseValue>,
}

impl AssessmentResponse {
    pub fn numeric(question_id: &str, section: &str, value: f64) -> Self {
        Self {
            question_id: question_id.to_string(),
            section: Some(section.to_string()),
            value: Some(ResponseValue::Number(value)),
            ..Default::default()
        }
    }

    fn field_contains(field: &Option<String>, keyword: &str) -> bool {
        field
            .as_deref()
            .is_some_and(|f| f.to_lowercase().contains(keyword))
    }

    pub fn question_contains(&self, keyword: &str) -> bool {
        Self::field_contains(&self.question, keyword)
    }

    pub fn section_contains(&self, keyword: &str) -> bool {
        Self::field_contains(&self.section, keyword)
    }

    pub fn topic_contains(&self, keyword: &str) -> bool {
        Self::field_contains(&self.topic, keyword)
    }

    pub fn tag_contains(&self, keyword: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase().contains(keyword))
    }
}

/// 組織のコンテキスト情報 (ベンチマーク補正に使用)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProfile {
    #[serde(default)]
    pub employee_count: u32,
    pub digital_maturity: Option<f64>,
    pub innovation_capacity: Option<f64>,
    /// `community_college` / `research_university` など
    pub institution_type: Option<String>,
}

/// 回答群の平均スコア。該当回答がなければ中立値 0.5
pub fn mean_score<'a, I, F>(responses: I, score: F) -> f64
where
    I: IntoIterator<Item = &'a AssessmentResponse>,
    F: Fn(&AssessmentResponse) -> f64,
{
    let (total, count) = responses
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), r| (sum + score(r), n + 1));
    if count == 0 {
        0.5
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_value_untagged() {
        let numeric: AssessmentResponse =
            serde_json::from_str(r#"{"questionId":"q1","value":3}"#).unwrap();
        assert_eq!(numeric.value, Some(ResponseValue::Number(3.0)));

        let text: AssessmentResponse =
            serde_json::from_str(r#"{"questionId":"q2","prompt":"Team culture","value":"Good"}"#)
                .unwrap();
        assert_eq!(text.value, Some(ResponseValue::Text("Good".into())));
        assert!(text.question_contains("culture"));
    }

    #[test]
    fn test_mean_score_defaults_to_neutral() {
        let empty: Vec<AssessmentResponse> = vec![];
        assert_eq!(mean_score(&empty, |_| 1.0), 0.5);
    }
}
