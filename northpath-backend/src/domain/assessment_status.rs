// northpath-backend/src/domain/assessment_status.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 診断の処理状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Pending,
    InProgress,
    Completed,
    Analyzed,
    Delivered,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Analyzed => "ANALYZED",
            Self::Delivered => "DELIVERED",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::InProgress,
            Self::Completed,
            Self::Analyzed,
            Self::Delivered,
        ]
    }

    /// 回答の提出が済んでいるか
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Completed | Self::Analyzed | Self::Delivered)
    }
}

impl FromStr for AssessmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "ANALYZED" => Ok(Self::Analyzed),
            "DELIVERED" => Ok(Self::Delivered),
            _ => Err(format!("Invalid assessment status: {}", s)),
        }
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 継続課金ティアの契約状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    GracePeriod,
    Expired,
    Cancelled,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::GracePeriod => "grace_period",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Unpaid => "unpaid",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Active | Self::GracePeriod)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "grace_period" => Ok(Self::GracePeriod),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "unpaid" => Ok(Self::Unpaid),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_status_round_trip() {
        for status in AssessmentStatus::all() {
            assert_eq!(status.as_str().parse::<AssessmentStatus>(), Ok(status));
        }
        assert_eq!(
            "in_progress".parse::<AssessmentStatus>(),
            Ok(AssessmentStatus::InProgress)
        );
        assert!("DONE".parse::<AssessmentStatus>().is_err());
    }

    #[test]
    fn test_submitted_states() {
        assert!(!AssessmentStatus::Pending.is_submitted());
        assert!(AssessmentStatus::Analyzed.is_submitted());
    }

    #[test]
    fn test_subscription_status() {
        assert_eq!(
            "canceled".parse::<SubscriptionStatus>(),
            Ok(SubscriptionStatus::Cancelled)
        );
        assert!(SubscriptionStatus::GracePeriod.is_valid());
        assert!(!SubscriptionStatus::Expired.is_valid());
        assert_eq!(SubscriptionStatus::GracePeriod.to_string(), "grace_period");
    }
}
