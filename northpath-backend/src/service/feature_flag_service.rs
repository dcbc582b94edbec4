// northpath-backend/src/service/feature_flag_service.rs

use crate::domain::feature_flag::{Environment, FeatureContext, FeatureFlag, FeatureFlagRegistry};
use crate::error::{AppError, AppResult};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStatus {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOverview {
    pub environment: Environment,
    pub enabled_features: Vec<&'static str>,
    pub features: Vec<FeatureStatus>,
}

pub struct FeatureFlagService {
    registry: FeatureFlagRegistry,
}

impl FeatureFlagService {
    pub fn new(registry: FeatureFlagRegistry) -> Self {
        Self { registry }
    }

    pub fn for_environment(environment: &str) -> Self {
        Self::new(FeatureFlagRegistry::for_environment(Environment::parse(
            environment,
        )))
    }

    pub fn is_enabled(&self, flag: &str, ctx: &FeatureContext) -> bool {
        self.registry.is_enabled(flag, ctx)
    }

    /// 無効なら 403 (Feature not available)
    pub fn require(&self, flag: &str, ctx: &FeatureContext) -> AppResult<()> {
        if self.registry.is_enabled(flag, ctx) {
            return Ok(());
        }
        debug!(flag = %flag, user_id = ?ctx.user_id, "Feature gate rejected request");
        Err(AppError::FeatureUnavailable(flag.to_string()))
    }

    fn status_of(&self, flag: &FeatureFlag, ctx: &FeatureContext) -> FeatureStatus {
        FeatureStatus {
            key: flag.key,
            name: flag.name,
            description: flag.description,
            enabled: self.registry.is_enabled(flag.key, ctx),
        }
    }

    pub fn overview(&self, ctx: &FeatureContext) -> FeatureOverview {
        FeatureOverview {
            environment: self.registry.environment(),
            enabled_features: self.registry.enabled_features(ctx),
            features: self
                .registry
                .flags()
                .iter()
                .map(|flag| self.status_of(flag, ctx))
                .collect(),
        }
    }

    pub fn status(&self, flag: &str, ctx: &FeatureContext) -> AppResult<FeatureStatus> {
        self.registry
            .find(flag)
            .map(|f| self.status_of(f, ctx))
            .ok_or_else(|| AppError::NotFound(format!("Feature flag not found: {}", flag)))
    }
}
