// northpath-backend/src/domain/feature_flag.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// 不明な値は development 扱い
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub key: &'static str,
    pub name: &'static str,
    pub enabled: bool,
    pub description: &'static str,
    pub rollout_percentage: u8,
    pub user_groups: Vec<&'static str>,
    pub environments: Vec<Environment>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// 評価時の利用者情報
#[derive(Debug, Clone, Default)]
pub struct FeatureContext {
    pub user_id: Option<String>,
    pub tier: Option<String>,
    pub groups: Vec<String>,
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn default_flags() -> Vec<FeatureFlag> {
    use Environment::*;
    vec![
        FeatureFlag {
            key: "MONTE_CARLO_SIMULATION",
            name: "monte-carlo-simulation",
            enabled: false,
            description: "Advanced Monte Carlo simulation for DSCH scenarios with probabilistic modeling",
            rollout_percentage: 0,
            user_groups: vec!["enterprise", "beta"],
            environments: vec![Development, Staging],
            start_date: date(2025, 4, 1),
            end_date: date(2025, 8, 1),
        },
        FeatureFlag {
            key: "DSCH_ENHANCED",
            name: "dsch-enhanced",
            enabled: false,
            description: "Enhanced Decision Support for Cost-Heavy scenarios with advanced analytics",
            rollout_percentage: 0,
            user_groups: vec!["enterprise"],
            environments: vec![Development],
            start_date: date(2025, 4, 15),
            end_date: None,
        },
        FeatureFlag {
            key: "BANNER_ERP_INTEGRATION",
            name: "banner-erp-integration",
            enabled: false,
            description: "Real-time integration with Banner Student Information System",
            rollout_percentage: 0,
            user_groups: vec!["enterprise", "education"],
            environments: vec![Development],
            start_date: date(2025, 7, 1),
            end_date: None,
        },
        FeatureFlag {
            key: "WORKDAY_ENHANCED",
            name: "workday-enhanced",
            enabled: false,
            description: "Enhanced Workday HCM integration with real-time sync and webhooks",
            rollout_percentage: 0,
            user_groups: vec!["enterprise"],
            environments: vec![Development, Staging],
            start_date: date(2025, 6, 15),
            end_date: None,
        },
        FeatureFlag {
            key: "ROW_LEVEL_SECURITY",
            name: "row-level-security",
            enabled: false,
            description: "Advanced multi-tenant security with granular data access controls",
            rollout_percentage: 0,
            user_groups: vec!["enterprise"],
            environments: vec![Development],
            start_date: date(2026, 1, 1),
            end_date: None,
        },
        FeatureFlag {
            key: "ADVANCED_ANALYTICS",
            name: "advanced-analytics",
            enabled: false,
            description: "Enhanced analytics dashboard with predictive modeling",
            rollout_percentage: 0,
            user_groups: vec!["enterprise", "ai-enhanced"],
            environments: vec![Development],
            start_date: date(2025, 9, 1),
            end_date: None,
        },
        FeatureFlag {
            key: "REAL_TIME_COLLABORATION",
            name: "real-time-collaboration",
            enabled: false,
            description: "Real-time collaborative scenario building and analysis",
            rollout_percentage: 0,
            user_groups: vec!["team", "enterprise"],
            environments: vec![Development],
            start_date: date(2025, 10, 1),
            end_date: None,
        },
        FeatureFlag {
            key: "CUSTOM_REPORTING",
            name: "custom-reporting",
            enabled: false,
            description: "Advanced custom report builder with drag-and-drop interface",
            rollout_percentage: 0,
            user_groups: vec!["comprehensive", "enterprise"],
            environments: vec![Development],
            start_date: date(2025, 11, 1),
            end_date: None,
        },
        FeatureFlag {
            key: "API_RATE_LIMITING_ENHANCED",
            name: "api-rate-limiting-enhanced",
            enabled: true,
            description: "Enhanced API rate limiting with tier-based quotas",
            rollout_percentage: 100,
            user_groups: vec!["all"],
            environments: vec![Development, Staging, Production],
            start_date: None,
            end_date: None,
        },
        FeatureFlag {
            key: "AUDIT_LOGGING",
            name: "audit-logging",
            enabled: true,
            description: "Comprehensive audit logging for compliance and security",
            rollout_percentage: 100,
            user_groups: vec!["enterprise"],
            environments: vec![Staging, Production],
            start_date: None,
            end_date: None,
        },
    ]
}

/// 環境ごとの上書き (有効化 + ロールアウト率)
fn environment_overrides(environment: Environment) -> &'static [(&'static str, u8)] {
    match environment {
        Environment::Development => &[
            ("MONTE_CARLO_SIMULATION", 100),
            ("DSCH_ENHANCED", 100),
            ("BANNER_ERP_INTEGRATION", 100),
            ("WORKDAY_ENHANCED", 100),
        ],
        Environment::Staging => &[("MONTE_CARLO_SIMULATION", 50), ("WORKDAY_ENHANCED", 75)],
        Environment::Production => &[
            ("AUDIT_LOGGING", 100),
            ("API_RATE_LIMITING_ENHANCED", 100),
        ],
    }
}

/// 0..100 のバケット。同じフラグと利用者の組み合わせでは常に同じ値になる
pub fn rollout_bucket(flag_name: &str, user_id: &str) -> u8 {
    let digest = Sha256::digest(format!("{}:{}", flag_name, user_id).as_bytes());
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (value % 100) as u8
}

#[derive(Debug, Clone)]
pub struct FeatureFlagRegistry {
    environment: Environment,
    flags: Vec<FeatureFlag>,
}

impl FeatureFlagRegistry {
    pub fn for_environment(environment: Environment) -> Self {
        let mut flags = default_flags();
        for (key, rollout) in environment_overrides(environment) {
            if let Some(flag) = flags.iter_mut().find(|f| f.key == *key) {
                flag.enabled = true;
                flag.rollout_percentage = *rollout;
            }
        }
        Self { environment, flags }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn flags(&self) -> &[FeatureFlag] {
        &self.flags
    }

    /// キー (MONTE_CARLO_SIMULATION) と名前 (monte-carlo-simulation) のどちらでも引ける
    pub fn find(&self, flag: &str) -> Option<&FeatureFlag> {
        self.flags
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(flag) || f.name == flag)
    }

    pub fn is_enabled_at(&self, flag: &str, ctx: &FeatureContext, now: DateTime<Utc>) -> bool {
        let Some(flag) = self.find(flag) else {
            tracing::warn!(flag = %flag, "Feature flag not found");
            return false;
        };

        if !flag.enabled {
            return false;
        }
        if !flag.environments.contains(&self.environment) {
            return false;
        }

        let today = now.date_naive();
        if flag.start_date.is_some_and(|start| today < start) {
            return false;
        }
        if flag.end_date.is_some_and(|end| today > end) {
            return false;
        }

        if !flag.user_groups.is_empty() {
            let has_access = flag.user_groups.iter().any(|group| {
                *group == "all"
                    || ctx.tier.as_deref() == Some(*group)
                    || ctx.groups.iter().any(|g| g == group)
            });
            if !has_access {
                return false;
            }
        }

        if flag.rollout_percentage < 100 {
            return match ctx.user_id.as_deref() {
                Some(user_id) => rollout_bucket(flag.name, user_id) < flag.rollout_percentage,
                None => false,
            };
        }

        true
    }

    pub fn is_enabled(&self, flag: &str, ctx: &FeatureContext) -> bool {
        self.is_enabled_at(flag, ctx, Utc::now())
    }

    pub fn enabled_features(&self, ctx: &FeatureContext) -> Vec<&'static str> {
        let now = Utc::now();
        self.flags
            .iter()
            .filter(|f| self.is_enabled_at(f.key, ctx, now))
            .map(|f| f.key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn enterprise_user(id: &str) -> FeatureContext {
        FeatureContext {
            user_id: Some(id.to_string()),
            tier: Some("enterprise".to_string()),
            groups: vec![],
        }
    }

    #[test]
    fn test_unknown_and_disabled_flags() {
        let registry = FeatureFlagRegistry::for_environment(Environment::Production);
        let ctx = enterprise_user("u1");
        assert!(!registry.is_enabled("NOT_A_FLAG", &ctx));
        assert!(!registry.is_enabled("DSCH_ENHANCED", &ctx));
    }

    #[test]
    fn test_environment_overrides() {
        let dev = FeatureFlagRegistry::for_environment(Environment::Development);
        let flag = dev.find("dsch-enhanced").unwrap();
        assert!(flag.enabled);
        assert_eq!(flag.rollout_percentage, 100);

        let staging = FeatureFlagRegistry::for_environment(Environment::Staging);
        assert_eq!(staging.find("WORKDAY_ENHANCED").unwrap().rollout_percentage, 75);
        assert!(!staging.find("DSCH_ENHANCED").unwrap().enabled);
    }

    #[test]
    fn test_environment_restriction() {
        // AUDIT_LOGGING は development を含まない
        let dev = FeatureFlagRegistry::for_environment(Environment::Development);
        assert!(!dev.is_enabled("AUDIT_LOGGING", &enterprise_user("u1")));

        let prod = FeatureFlagRegistry::for_environment(Environment::Production);
        assert!(prod.is_enabled("AUDIT_LOGGING", &enterprise_user("u1")));
    }

    #[test]
    fn test_date_window() {
        let dev = FeatureFlagRegistry::for_environment(Environment::Development);
        let ctx = enterprise_user("u1");
        assert!(!dev.is_enabled_at("MONTE_CARLO_SIMULATION", &ctx, at(2025, 3, 31)));
        assert!(dev.is_enabled_at("MONTE_CARLO_SIMULATION", &ctx, at(2025, 5, 1)));
        assert!(!dev.is_enabled_at("MONTE_CARLO_SIMULATION", &ctx, at(2025, 8, 2)));
    }

    #[test]
    fn test_group_gate() {
        let dev = FeatureFlagRegistry::for_environment(Environment::Development);
        let now = at(2025, 5, 1);
        let outsider = FeatureContext {
            user_id: Some("u2".to_string()),
            tier: Some("one-time-diagnostic".to_string()),
            groups: vec![],
        };
        assert!(!dev.is_enabled_at("MONTE_CARLO_SIMULATION", &outsider, now));

        let beta = FeatureContext {
            groups: vec!["beta".to_string()],
            ..outsider
        };
        assert!(dev.is_enabled_at("MONTE_CARLO_SIMULATION", &beta, now));

        let prod = FeatureFlagRegistry::for_environment(Environment::Production);
        assert!(prod.is_enabled("API_RATE_LIMITING_ENHANCED", &FeatureContext::default()));
    }

    #[test]
    fn test_rollout_is_deterministic() {
        let staging = FeatureFlagRegistry::for_environment(Environment::Staging);
        let now = at(2025, 5, 1);

        for i in 0..50 {
            let ctx = enterprise_user(&format!("user-{i}"));
            let first = staging.is_enabled_at("MONTE_CARLO_SIMULATION", &ctx, now);
            let second = staging.is_enabled_at("MONTE_CARLO_SIMULATION", &ctx, now);
            assert_eq!(first, second);
            assert_eq!(
                first,
                rollout_bucket("monte-carlo-simulation", &format!("user-{i}")) < 50
            );
        }

        let anonymous = FeatureContext {
            tier: Some("enterprise".to_string()),
            ..Default::default()
        };
        assert!(!staging.is_enabled_at("MONTE_CARLO_SIMULATION", &anonymous, now));
    }

    #[test]
    fn test_bucket_range_and_spread() {
        let buckets: Vec<u8> = (0..200)
            .map(|i| rollout_bucket("workday-enhanced", &i.to_string()))
            .collect();
        assert!(buckets.iter().all(|b| *b < 100));
        let admitted = buckets.iter().filter(|b| **b < 75).count();
        assert!(admitted > 100 && admitted < 190);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Staging);
        assert_eq!(Environment::parse("test"), Environment::Development);
    }
}
