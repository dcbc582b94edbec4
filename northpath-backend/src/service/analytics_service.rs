// northpath-backend/src/service/analytics_service.rs

//! 管理者向けの診断集計とチームの共同作業集計

use crate::db::DbPool;
use crate::domain::assessment_model::Model as Assessment;
use crate::domain::assessment_comment_model::Model as Comment;
use crate::error::{AppError, AppResult};
use crate::repository::assessment_comment_repository::AssessmentCommentRepository;
use crate::repository::assessment_repository::AssessmentRepository;
use crate::repository::team_invitation_repository::TeamInvitationRepository;
use crate::repository::team_repository::TeamRepository;
use crate::service::collaboration_service::Actor;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const MAX_RANGE_DAYS: i64 = 365;
pub const RECENT_ASSESSMENT_COUNT: usize = 10;

/// AI 準備度スコアの分布区間 (上限を含む)
const SCORE_BUCKETS: [(&str, f64); 5] = [
    ("0-20", 20.0),
    ("21-40", 40.0),
    ("41-60", 60.0),
    ("61-80", 80.0),
    ("81-100", f64::INFINITY),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReadinessScores {
    pub average: f64,
    pub by_tier: BTreeMap<String, f64>,
    pub distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAssessment {
    pub id: Uuid,
    pub tier: String,
    pub industry: String,
    pub institution: String,
    pub created_at: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    pub range_days: i64,
    pub total_assessments: usize,
    pub assessments_by_type: BTreeMap<String, u64>,
    pub assessments_by_tier: BTreeMap<String, u64>,
    pub assessments_by_industry: BTreeMap<String, u64>,
    pub assessments_by_month: BTreeMap<String, u64>,
    pub completion_rates: BTreeMap<String, f64>,
    pub avg_response_counts: BTreeMap<String, f64>,
    pub ai_readiness_scores: AiReadinessScores,
    pub recent_assessments: Vec<RecentAssessment>,
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn score_bucket(score: f64) -> &'static str {
    SCORE_BUCKETS
        .iter()
        .find(|(_, upper)| score <= *upper)
        .map(|(label, _)| *label)
        .unwrap_or("81-100")
}

/// 分析結果があれば完了扱い
fn is_completed(assessment: &Assessment) -> bool {
    assessment.analysis_results.is_some()
}

/// 新しい順に並んだ診断一覧を集計する
pub fn aggregate_assessments(assessments: &[Assessment], range_days: i64) -> AdminAnalytics {
    let mut analytics = AdminAnalytics {
        range_days,
        total_assessments: assessments.len(),
        ..Default::default()
    };

    let mut response_counts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut completions: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    let mut tier_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut all_scores = Vec::new();

    for (label, _) in SCORE_BUCKETS {
        analytics
            .ai_readiness_scores
            .distribution
            .insert(label.to_string(), 0);
    }

    for assessment in assessments {
        let tier = assessment.tier.clone();
        *analytics
            .assessments_by_type
            .entry(assessment.assessment_type.clone())
            .or_default() += 1;
        *analytics.assessments_by_tier.entry(tier.clone()).or_default() += 1;
        *analytics
            .assessments_by_industry
            .entry(assessment.organization_type.clone())
            .or_default() += 1;
        *analytics
            .assessments_by_month
            .entry(assessment.created_at.format("%Y-%m").to_string())
            .or_default() += 1;

        response_counts
            .entry(tier.clone())
            .or_default()
            .push(assessment.response_count() as f64);

        let entry = completions.entry(tier.clone()).or_default();
        entry.0 += 1;
        if is_completed(assessment) {
            entry.1 += 1;
        }

        if let Some(score) = assessment.ai_readiness_score {
            all_scores.push(score);
            tier_scores.entry(tier).or_default().push(score);
            *analytics
                .ai_readiness_scores
                .distribution
                .entry(score_bucket(score).to_string())
                .or_default() += 1;
        }
    }

    analytics.completion_rates = completions
        .into_iter()
        .map(|(tier, (total, completed))| (tier, completed as f64 / total as f64))
        .collect();
    analytics.avg_response_counts = response_counts
        .into_iter()
        .map(|(tier, counts)| (tier, average(&counts)))
        .collect();
    analytics.ai_readiness_scores.average = average(&all_scores);
    analytics.ai_readiness_scores.by_tier = tier_scores
        .into_iter()
        .map(|(tier, scores)| (tier, average(&scores)))
        .collect();

    analytics.recent_assessments = assessments
        .iter()
        .take(RECENT_ASSESSMENT_COUNT)
        .map(|a| RecentAssessment {
            id: a.id,
            tier: a.tier.clone(),
            industry: a.organization_type.clone(),
            institution: a
                .institution_name
                .clone()
                .unwrap_or_else(|| "Unknown Institution".to_string()),
            created_at: a.created_at,
            status: if is_completed(a) {
                "completed"
            } else {
                "in-progress"
            },
        })
        .collect();

    analytics
}

/// チーム集計の期間
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityRange {
    #[default]
    Week,
    Month,
    Year,
}

impl ActivityRange {
    pub fn days(&self) -> i64 {
        match self {
            ActivityRange::Week => 7,
            ActivityRange::Month => 30,
            ActivityRange::Year => 365,
        }
    }
}

impl FromStr for ActivityRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(ActivityRange::Week),
            "month" => Ok(ActivityRange::Month),
            "year" => Ok(ActivityRange::Year),
            _ => Err(format!("Invalid range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberActivity {
    pub email: String,
    pub comments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCollaboration {
    pub team_id: Uuid,
    pub range: ActivityRange,
    pub member_count: usize,
    pub pending_invitations: u64,
    pub new_members: usize,
    pub active_members: usize,
    pub total_comments: usize,
    pub member_activity: Vec<MemberActivity>,
    pub section_activity: BTreeMap<String, u64>,
    pub activity_timeline: BTreeMap<String, u64>,
}

/// メンバーごとのコメント数 (多い順)、セクション別、日別の件数
pub fn comment_activity(
    member_emails: &[String],
    comments: &[Comment],
) -> (Vec<MemberActivity>, BTreeMap<String, u64>, BTreeMap<String, u64>) {
    let mut per_member: BTreeMap<String, u64> = member_emails
        .iter()
        .map(|email| (email.to_lowercase(), 0))
        .collect();
    let mut sections = BTreeMap::new();
    let mut timeline = BTreeMap::new();

    for comment in comments {
        *per_member
            .entry(comment.user_email.to_lowercase())
            .or_default() += 1;
        let section = comment
            .section
            .clone()
            .unwrap_or_else(|| "General".to_string());
        *sections.entry(section).or_default() += 1;
        *timeline
            .entry(comment.created_at.format("%Y-%m-%d").to_string())
            .or_default() += 1;
    }

    let mut members: Vec<MemberActivity> = per_member
        .into_iter()
        .map(|(email, comments)| MemberActivity { email, comments })
        .collect();
    members.sort_by(|a, b| b.comments.cmp(&a.comments).then(a.email.cmp(&b.email)));

    (members, sections, timeline)
}

pub struct AnalyticsService {
    assessment_repo: AssessmentRepository,
    team_repo: TeamRepository,
    invitation_repo: TeamInvitationRepository,
    comment_repo: AssessmentCommentRepository,
}

impl AnalyticsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            assessment_repo: AssessmentRepository::new(db.clone()),
            team_repo: TeamRepository::new(db.clone()),
            invitation_repo: TeamInvitationRepository::new(db.clone()),
            comment_repo: AssessmentCommentRepository::new(db),
        }
    }

    pub async fn admin_overview(&self, range_days: Option<i64>) -> AppResult<AdminAnalytics> {
        let range_days = range_days
            .unwrap_or(DEFAULT_RANGE_DAYS)
            .clamp(1, MAX_RANGE_DAYS);
        let since = Utc::now() - Duration::days(range_days);
        let assessments = self.assessment_repo.find_created_since(since).await?;
        Ok(aggregate_assessments(&assessments, range_days))
    }

    /// チームメンバー (またはシステム管理者) のみ
    pub async fn team_collaboration(
        &self,
        team_id: Uuid,
        range: ActivityRange,
        actor: &Actor,
    ) -> AppResult<TeamCollaboration> {
        if self.team_repo.find_by_id(team_id).await?.is_none() {
            return Err(AppError::NotFound("Team not found".to_string()));
        }
        let is_member = self
            .team_repo
            .find_member(team_id, actor.user_id)
            .await?
            .is_some();
        if !is_member && !actor.is_admin {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let since = Utc::now() - Duration::days(range.days());
        let members = self.team_repo.find_members(team_id).await?;
        let new_members = self
            .team_repo
            .find_members_joined_since(team_id, since)
            .await?
            .len();
        let pending_invitations = self.invitation_repo.count_pending_by_team(team_id).await?;

        let comments = self
            .comment_repo
            .find_by_users_since(members.iter().map(|m| m.user_id).collect(), since)
            .await?;
        let emails: Vec<String> = members.iter().map(|m| m.email.clone()).collect();
        let (member_activity, section_activity, activity_timeline) =
            comment_activity(&emails, &comments);
        let active_members = member_activity.iter().filter(|m| m.comments > 0).count();

        Ok(TeamCollaboration {
            team_id,
            range,
            member_count: members.len(),
            pending_invitations,
            new_members,
            active_members,
            total_comments: comments.len(),
            member_activity,
            section_activity,
            activity_timeline,
        })
    }
}
