// northpath-backend/src/api/dto/analytics_dto.rs

use crate::error::{AppError, AppResult};
use crate::service::analytics_service::ActivityRange;
use serde::Deserialize;
use uuid::Uuid;

/// 管理者ダッシュボードの集計期間 (日)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminAnalyticsQuery {
    pub range: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamCollaborationQuery {
    pub team_id: Uuid,
    /// week | month | year
    pub range: Option<String>,
}

impl TeamCollaborationQuery {
    pub fn range(&self) -> AppResult<ActivityRange> {
        match self.range.as_deref() {
            None => Ok(ActivityRange::default()),
            Some(raw) => raw.parse().map_err(AppError::BadRequest),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

impl ExpiringQuery {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS).clamp(1, 365)
    }
}
