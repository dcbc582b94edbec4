// northpath-backend/src/domain/pricing_tier.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 料金ティア
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingTier {
    // AI readiness
    HigherEdAiPulseCheck,
    AiReadinessComprehensive,
    AiTransformationBlueprint,
    AiEnterprisePartnership,
    // 組織診断
    OneTimeDiagnostic,
    MonthlySubscription,
    ComprehensivePackage,
    EnterpriseTransformation,
}

/// AI ティアの上下関係 (低い順)
const AI_TIER_HIERARCHY: [PricingTier; 4] = [
    PricingTier::HigherEdAiPulseCheck,
    PricingTier::AiReadinessComprehensive,
    PricingTier::AiTransformationBlueprint,
    PricingTier::AiEnterprisePartnership,
];

impl PricingTier {
    /// PricingTierを文字列として取得
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HigherEdAiPulseCheck => "higher-ed-ai-pulse-check",
            Self::AiReadinessComprehensive => "ai-readiness-comprehensive",
            Self::AiTransformationBlueprint => "ai-transformation-blueprint",
            Self::AiEnterprisePartnership => "ai-enterprise-partnership",
            Self::OneTimeDiagnostic => "one-time-diagnostic",
            Self::MonthlySubscription => "monthly-subscription",
            Self::ComprehensivePackage => "comprehensive-package",
            Self::EnterpriseTransformation => "enterprise-transformation",
        }
    }

    /// 全ての有効なティアを取得
    pub fn all() -> Vec<Self> {
        vec![
            Self::HigherEdAiPulseCheck,
            Self::AiReadinessComprehensive,
            Self::AiTransformationBlueprint,
            Self::AiEnterprisePartnership,
            Self::OneTimeDiagnostic,
            Self::MonthlySubscription,
            Self::ComprehensivePackage,
            Self::EnterpriseTransformation,
        ]
    }

    pub fn is_ai_tier(&self) -> bool {
        AI_TIER_HIERARCHY.contains(self)
    }

    /// 継続課金 (期限管理の対象) となるティア
    pub fn is_subscription(&self) -> bool {
        matches!(
            self,
            Self::MonthlySubscription | Self::ComprehensivePackage | Self::EnterpriseTransformation
        )
    }

    /// 買い切りのティア
    pub fn is_one_time(&self) -> bool {
        matches!(self, Self::OneTimeDiagnostic | Self::ComprehensivePackage)
    }

    pub fn assessment_type(&self) -> &'static str {
        if self.is_ai_tier() {
            "ai-readiness"
        } else {
            "organizational"
        }
    }

    pub fn config(&self) -> &'static TierConfiguration {
        match self {
            Self::HigherEdAiPulseCheck => &PULSE_CHECK,
            Self::AiReadinessComprehensive => &AI_COMPREHENSIVE,
            Self::AiTransformationBlueprint => &AI_BLUEPRINT,
            Self::AiEnterprisePartnership => &AI_ENTERPRISE,
            Self::OneTimeDiagnostic => &ONE_TIME_DIAGNOSTIC,
            Self::MonthlySubscription => &MONTHLY_SUBSCRIPTION,
            Self::ComprehensivePackage => &COMPREHENSIVE_PACKAGE,
            Self::EnterpriseTransformation => &ENTERPRISE_TRANSFORMATION,
        }
    }

    pub fn algorithms(&self) -> &'static TierAlgorithms {
        match self {
            Self::OneTimeDiagnostic => &TierAlgorithms {
                primary: &["OCI", "HOCI", "JCI"],
                advanced: &[],
                experimental: &[],
            },
            Self::MonthlySubscription => &TierAlgorithms {
                primary: &["OCI", "HOCI", "JCI", "DSCH"],
                advanced: &[],
                experimental: &[],
            },
            Self::ComprehensivePackage => &TierAlgorithms {
                primary: &["OCI", "HOCI", "JCI", "DSCH", "CRF", "LEI"],
                advanced: &["Cost-Savings Analysis"],
                experimental: &[],
            },
            Self::EnterpriseTransformation => &TierAlgorithms {
                primary: &["OCI", "HOCI", "JCI", "DSCH", "CRF", "LEI"],
                advanced: &["Monte Carlo DSCH", "Predictive Analytics", "ROI Modeling"],
                experimental: &["AI-Powered Recommendations", "Real-time Benchmarking"],
            },
            Self::HigherEdAiPulseCheck => &TierAlgorithms {
                primary: &["AIRIX"],
                advanced: &[],
                experimental: &[],
            },
            Self::AiReadinessComprehensive => &TierAlgorithms {
                primary: &["AIRIX", "AIRS", "AICS"],
                advanced: &[],
                experimental: &[],
            },
            Self::AiTransformationBlueprint => &TierAlgorithms {
                primary: &["AIRIX", "AIRS", "AICS", "AIMS", "AIPS"],
                advanced: &[],
                experimental: &[],
            },
            Self::AiEnterprisePartnership => &TierAlgorithms {
                primary: &["AIRIX", "AIRS", "AICS", "AIMS", "AIPS", "AIBS"],
                advanced: &["Advanced AI Strategy"],
                experimental: &["Predictive AI Modeling"],
            },
        }
    }

    /// primary + advanced + experimental
    pub fn available_algorithms(&self) -> Vec<&'static str> {
        let algorithms = self.algorithms();
        algorithms
            .primary
            .iter()
            .chain(algorithms.advanced)
            .chain(algorithms.experimental)
            .copied()
            .collect()
    }

    pub fn has_feature(&self, feature: TierFeature) -> bool {
        self.config().features.get(feature)
    }

    pub fn org_chart_capabilities(&self) -> OrgChartCapabilities {
        let config = self.config();
        OrgChartCapabilities {
            can_generate: config.features.org_chart_generator,
            can_model_scenarios: config.features.scenario_builder,
            can_collaborate: config.features.real_time_collaboration,
            max_scenarios: config.guardrails.max_scenarios,
        }
    }

    /// AI ティア同士の上下比較。組織診断ティアは同一ティアのみ許可
    pub fn has_ai_tier_access(&self, required: PricingTier) -> bool {
        let rank = |tier: &PricingTier| AI_TIER_HIERARCHY.iter().position(|t| t == tier);
        match (rank(self), rank(&required)) {
            (Some(user), Some(required)) => user >= required,
            _ => *self == required,
        }
    }
}

impl FromStr for PricingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|tier| tier.as_str() == normalized)
            .ok_or_else(|| format!("Invalid pricing tier: {}", s))
    }
}

impl std::fmt::Display for PricingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- ティア定義 -----------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentScope {
    pub question_count: u32,
    pub sections: &'static [&'static str],
    pub algorithms: &'static [&'static str],
    pub report_pages: u32,
    pub follow_up_support: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeatures {
    pub upload_support: bool,
    pub dashboard_refresh: bool,
    pub custom_reporting: bool,
    #[serde(rename = "powerBIEmbedded")]
    pub power_bi_embedded: bool,
    pub api_connectors: bool,
    pub on_site_facilitation: bool,
    pub progress_audits: bool,
    pub org_chart_generator: bool,
    pub scenario_builder: bool,
    pub monte_carlo_simulation: bool,
    pub real_time_collaboration: bool,
    pub ai_opportunity_assessment: bool,
    pub ai_readiness_score: bool,
    pub automation_recommendations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TierFeature {
    UploadSupport,
    DashboardRefresh,
    CustomReporting,
    #[serde(rename = "powerBIEmbedded")]
    PowerBiEmbedded,
    ApiConnectors,
    OnSiteFacilitation,
    ProgressAudits,
    OrgChartGenerator,
    ScenarioBuilder,
    MonteCarloSimulation,
    RealTimeCollaboration,
    AiOpportunityAssessment,
    AiReadinessScore,
    AutomationRecommendations,
}

impl TierFeatures {
    pub fn get(&self, feature: TierFeature) -> bool {
        match feature {
            TierFeature::UploadSupport => self.upload_support,
            TierFeature::DashboardRefresh => self.dashboard_refresh,
            TierFeature::CustomReporting => self.custom_reporting,
            TierFeature::PowerBiEmbedded => self.power_bi_embedded,
            TierFeature::ApiConnectors => self.api_connectors,
            TierFeature::OnSiteFacilitation => self.on_site_facilitation,
            TierFeature::ProgressAudits => self.progress_audits,
            TierFeature::OrgChartGenerator => self.org_chart_generator,
            TierFeature::ScenarioBuilder => self.scenario_builder,
            TierFeature::MonteCarloSimulation => self.monte_carlo_simulation,
            TierFeature::RealTimeCollaboration => self.real_time_collaboration,
            TierFeature::AiOpportunityAssessment => self.ai_opportunity_assessment,
            TierFeature::AiReadinessScore => self.ai_readiness_score,
            TierFeature::AutomationRecommendations => self.automation_recommendations,
        }
    }
}

/// None は無制限
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardrails {
    pub max_assessments: Option<u32>,
    pub max_users: Option<u32>,
    pub max_scenarios: Option<u32>,
    pub data_retention_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfiguration {
    pub name: &'static str,
    pub price: u32,
    pub target_customer: &'static str,
    pub core_deliverables: &'static [&'static str],
    pub assessment_scope: AssessmentScope,
    pub features: TierFeatures,
    pub guardrails: Guardrails,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierAlgorithms {
    pub primary: &'static [&'static str],
    pub advanced: &'static [&'static str],
    pub experimental: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgChartCapabilities {
    pub can_generate: bool,
    pub can_model_scenarios: bool,
    pub can_collaborate: bool,
    pub max_scenarios: Option<u32>,
}

const fn features(flags: [bool; 14]) -> TierFeatures {
    TierFeatures {
        upload_support: flags[0],
        dashboard_refresh: flags[1],
        custom_reporting: flags[2],
        power_bi_embedded: flags[3],
        api_connectors: flags[4],
        on_site_facilitation: flags[5],
        progress_audits: flags[6],
        org_chart_generator: flags[7],
        scenario_builder: flags[8],
        monte_carlo_simulation: flags[9],
        real_time_collaboration: flags[10],
        ai_opportunity_assessment: flags[11],
        ai_readiness_score: flags[12],
        automation_recommendations: flags[13],
    }
}

const UNLIMITED: Guardrails = Guardrails {
    max_assessments: None,
    max_users: None,
    max_scenarios: None,
    data_retention_months: None,
};

static PULSE_CHECK: TierConfiguration = TierConfiguration {
    name: "Higher Ed AI Pulse Check",
    price: 2000,
    target_customer:
        "Individual departments or small teams wanting a quick AI readiness snapshot",
    core_deliverables: &[
        "50-question streamlined AI readiness assessment",
        "AI-generated quick insights report (8-10 pages)",
        "AIRIX core algorithm analysis",
        "Essential AI readiness scoring across 6 domains",
        "Basic AI implementation recommendations",
        "Up to 2 users",
        "Email support",
    ],
    assessment_scope: AssessmentScope {
        question_count: 50,
        sections: &[
            "Strategic Leadership",
            "Governance & Policy",
            "Faculty AI Integration",
            "Technology Infrastructure",
            "Cultural Readiness",
            "Mission Alignment",
        ],
        algorithms: &["AIRIX"],
        report_pages: 10,
        follow_up_support: "Email support for 30 days + resource library access",
    },
    features: features([
        false, false, false, false, false, false, false, false, false, false, false, true, true,
        true,
    ]),
    guardrails: Guardrails {
        max_assessments: Some(1),
        max_users: Some(2),
        max_scenarios: None,
        data_retention_months: Some(6),
    },
};

static AI_COMPREHENSIVE: TierConfiguration = TierConfiguration {
    name: "AI Readiness Comprehensive",
    price: 4995,
    target_customer: "Higher education institutions seeking comprehensive AI readiness evaluation with advanced analytics",
    core_deliverables: &[
        "105-question comprehensive AI readiness assessment",
        "25-page detailed AI readiness report",
        "AIRIX, AIRS, AICS algorithm analysis",
        "Strategic document upload & AI analysis",
        "Team collaboration features",
        "Up to 5 users",
        "30-minute strategy consultation",
    ],
    assessment_scope: AssessmentScope {
        question_count: 105,
        sections: &[
            "Strategic Leadership",
            "Governance & Policy",
            "Faculty AI Integration",
            "Student AI Policy",
            "Employee Integration",
            "Technology Infrastructure",
            "Cultural Transformation",
            "Mission Alignment",
        ],
        algorithms: &["AIRIX", "AIRS", "AICS"],
        report_pages: 25,
        follow_up_support: "30-minute strategy consultation + email support for 60 days + resource library access",
    },
    features: features([
        true, false, true, false, false, false, false, false, false, false, true, true, true, true,
    ]),
    guardrails: Guardrails {
        max_assessments: Some(1),
        max_users: Some(5),
        max_scenarios: None,
        data_retention_months: Some(12),
    },
};

static AI_BLUEPRINT: TierConfiguration = TierConfiguration {
    name: "AI Transformation Blueprint",
    price: 24500,
    target_customer: "Higher education institutions ready for strategic AI implementation with expert guidance and comprehensive analysis",
    core_deliverables: &[
        "150-question in-depth AI assessment",
        "40-page AI Transformation Blueprint",
        "AIRIX, AIRS, AICS, AIMS, AIPS algorithm analysis",
        "Advanced AI scenario builder",
        "Strategic AI roadmap development",
        "Up to 15 users",
        "Up to 10 AI scenarios",
    ],
    assessment_scope: AssessmentScope {
        question_count: 150,
        sections: &[
            "Strategic Leadership",
            "Governance & Policy",
            "Faculty AI Integration",
            "Student AI Policy",
            "Employee Integration",
            "Technology Infrastructure",
            "Cultural Transformation",
            "Mission Alignment",
            "Advanced AI Strategy",
            "Implementation Planning",
        ],
        algorithms: &["AIRIX", "AIRS", "AICS", "AIMS", "AIPS"],
        report_pages: 40,
        follow_up_support: "60-minute strategy session + 30-day advisory access + implementation planning support",
    },
    features: features([
        true, true, true, false, false, false, false, false, true, false, true, true, true, true,
    ]),
    guardrails: Guardrails {
        max_assessments: Some(1),
        max_users: Some(15),
        max_scenarios: Some(10),
        data_retention_months: Some(24),
    },
};

static AI_ENTERPRISE: TierConfiguration = TierConfiguration {
    name: "Enterprise Partnership",
    price: 0,
    target_customer: "Large institutions, multi-campus systems, R1 universities seeking comprehensive AI transformation partnership",
    core_deliverables: &[
        "Full AI Transformation Blueprint included",
        "Quarterly AI readiness re-assessments",
        "AIRIX, AIRS, AICS, AIMS, AIPS, AIBS full algorithm suite",
        "Advanced scenario modeling & forecasting",
        "Custom integration development",
        "Unlimited users and assessments",
    ],
    assessment_scope: AssessmentScope {
        question_count: 200,
        sections: &[
            "Strategic AI Leadership",
            "Governance & Policy Framework",
            "Technology Infrastructure",
            "Faculty & Pedagogy Integration",
            "Student AI Policy",
            "Employee Integration",
            "Academic Integrity",
            "Continuous Improvement",
            "Research Integration",
            "External Partnerships",
        ],
        algorithms: &["AIRIX", "AIRS", "AICS", "AIMS", "AIPS", "AIBS"],
        report_pages: 50,
        follow_up_support: "Annual retainer with dedicated advisory channel and quarterly strategy sessions",
    },
    features: features([
        true, true, true, true, true, true, true, false, true, true, true, true, true, true,
    ]),
    guardrails: UNLIMITED,
};

static ONE_TIME_DIAGNOSTIC: TierConfiguration = TierConfiguration {
    name: "One-Time Diagnostic",
    price: 4995,
    target_customer: "Organizations seeking comprehensive assessment with foundational analysis",
    core_deliverables: &[
        "100-question organizational assessment",
        "DSCH, CRF, LEI analysis",
        "Comprehensive PDF report",
        "Organizational chart generation",
        "Basic AI opportunity assessment",
        "Up to 2 users",
        "Email support",
    ],
    assessment_scope: AssessmentScope {
        question_count: 100,
        sections: &[
            "Leadership & Strategy",
            "Operations & Processes",
            "Human Capital",
            "Technology & Infrastructure",
            "Culture & Change Management",
            "Performance Management",
        ],
        algorithms: &["DSCH", "CRF", "LEI"],
        report_pages: 15,
        follow_up_support: "Email support for 30 days",
    },
    features: features([
        true, false, false, false, false, false, false, true, false, false, false, true, false,
        true,
    ]),
    guardrails: Guardrails {
        max_assessments: Some(1),
        max_users: Some(2),
        max_scenarios: None,
        data_retention_months: Some(6),
    },
};

static MONTHLY_SUBSCRIPTION: TierConfiguration = TierConfiguration {
    name: "Monthly Subscription",
    price: 2995,
    target_customer:
        "Organizations needing ongoing assessment capabilities with advanced features",
    core_deliverables: &[
        "120-question comprehensive assessment",
        "DSCH, CRF, LEI, OCI, HOCI analysis",
        "Dashboard refresh capabilities",
        "CSV data exports",
        "Unlimited assessments (monthly)",
        "Up to 5 users",
    ],
    assessment_scope: AssessmentScope {
        question_count: 120,
        sections: &[
            "Strategic Leadership",
            "Operational Excellence",
            "Human Capital Development",
            "Technology Integration",
            "Cultural Transformation",
            "Performance Analytics",
            "Change Management",
            "Innovation Capacity",
        ],
        algorithms: &["DSCH", "CRF", "LEI", "OCI", "HOCI"],
        report_pages: 20,
        follow_up_support: "Priority email support + monthly check-ins",
    },
    features: features([
        true, true, true, false, false, false, false, true, false, false, false, true, false, true,
    ]),
    guardrails: Guardrails {
        max_assessments: None,
        max_users: Some(5),
        max_scenarios: None,
        data_retention_months: Some(12),
    },
};

static COMPREHENSIVE_PACKAGE: TierConfiguration = TierConfiguration {
    name: "Comprehensive Package",
    price: 9900,
    target_customer:
        "Organizations seeking complete transformation analysis with scenario planning",
    core_deliverables: &[
        "150-question in-depth assessment",
        "Full algorithm suite analysis",
        "30-page comprehensive report",
        "Advanced scenario builder",
        "Cost-savings analysis",
        "Up to 10 users",
    ],
    assessment_scope: AssessmentScope {
        question_count: 150,
        sections: &[
            "Strategic Leadership",
            "Operational Excellence",
            "Human Capital Development",
            "Technology Integration",
            "Cultural Transformation",
            "Performance Analytics",
            "Change Management",
            "Innovation Capacity",
            "Financial Performance",
            "Risk Management",
        ],
        algorithms: &["DSCH", "CRF", "LEI", "OCI", "HOCI", "Cost-Savings Analysis"],
        report_pages: 30,
        follow_up_support: "60-minute strategy session + email support for 90 days",
    },
    features: features([
        true, true, true, false, false, false, false, true, true, false, true, true, false, true,
    ]),
    guardrails: Guardrails {
        max_assessments: Some(1),
        max_users: Some(10),
        max_scenarios: Some(5),
        data_retention_months: Some(18),
    },
};

static ENTERPRISE_TRANSFORMATION: TierConfiguration = TierConfiguration {
    name: "Enterprise Transformation",
    price: 24000,
    target_customer:
        "Large enterprises seeking comprehensive transformation with predictive analytics",
    core_deliverables: &[
        "200-question enterprise assessment",
        "Full algorithm suite + Monte Carlo analysis",
        "Power BI dashboard integration",
        "API connectors for data integration",
        "Quarterly progress audits",
        "Unlimited users and assessments",
    ],
    assessment_scope: AssessmentScope {
        question_count: 200,
        sections: &[
            "Executive Leadership",
            "Strategic Planning",
            "Operational Excellence",
            "Human Capital Strategy",
            "Technology Architecture",
            "Digital Transformation",
            "Cultural Evolution",
            "Performance Management",
            "Financial Optimization",
            "Risk & Compliance",
            "Innovation Management",
            "Stakeholder Engagement",
        ],
        algorithms: &[
            "DSCH",
            "CRF",
            "LEI",
            "OCI",
            "HOCI",
            "Monte Carlo",
            "Predictive Analytics",
            "ROI Modeling",
        ],
        report_pages: 50,
        follow_up_support: "Dedicated account manager + quarterly strategy sessions",
    },
    features: features([
        true, true, true, true, true, true, true, true, true, true, true, true, false, true,
    ]),
    guardrails: UNLIMITED,
};

// --- 業種モジュール -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryModule {
    pub key: &'static str,
    pub name: &'static str,
    pub sections: &'static [&'static str],
    pub specialized_questions: u32,
}

pub static INDUSTRY_MODULES: [IndustryModule; 3] = [
    IndustryModule {
        key: "higher-education",
        name: "Higher Education",
        sections: &[
            "Academic Programs & Curriculum",
            "Faculty & Instructional Support",
            "Enrollment Management & Admissions",
            "Student Affairs & Success Services",
            "Continuing Education & Workforce Development",
        ],
        specialized_questions: 45,
    },
    IndustryModule {
        key: "healthcare",
        name: "Healthcare",
        sections: &[
            "Clinical Operations & Patient Care",
            "Medical Staff & Provider Management",
            "Revenue Cycle & Patient Financial Services",
            "Quality & Patient Safety",
            "Regulatory Compliance & Accreditation",
        ],
        specialized_questions: 40,
    },
    IndustryModule {
        key: "public-sector",
        name: "Public Sector",
        sections: &[
            "Public Service Delivery",
            "Regulatory & Compliance Functions",
            "Citizen Engagement & Communications",
            "Intergovernmental Relations",
            "Performance Measurement & Transparency",
        ],
        specialized_questions: 35,
    },
];

pub fn industry_module(organization_type: &str) -> Option<&'static IndustryModule> {
    INDUSTRY_MODULES
        .iter()
        .find(|m| m.key == organization_type)
}

/// 業種別に追加されるセクション (ティアの設問数の3割が上限)
pub fn industry_sections(organization_type: &str, tier: PricingTier) -> Vec<&'static str> {
    let Some(module) = industry_module(organization_type) else {
        return Vec::new();
    };
    let budget = (module.specialized_questions as f64)
        .min(tier.config().assessment_scope.question_count as f64 * 0.3);
    let count = (budget / 10.0).ceil() as usize;
    module.sections.iter().take(count).copied().collect()
}

// --- 利用上限 -------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierUsage {
    pub assessments_used: Option<u32>,
    pub users_count: Option<u32>,
    pub scenarios_created: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_required: Option<bool>,
}

impl UsageValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            message: None,
            upgrade_required: None,
        }
    }

    fn limit(message: String) -> Self {
        Self {
            valid: false,
            message: Some(message),
            upgrade_required: Some(true),
        }
    }
}

pub fn validate_usage(tier: PricingTier, usage: &TierUsage) -> UsageValidation {
    let guardrails = tier.config().guardrails;

    if let (Some(max), Some(used)) = (guardrails.max_assessments, usage.assessments_used) {
        if used > max {
            return UsageValidation::limit(format!(
                "Assessment limit reached ({}). Upgrade to continue.",
                max
            ));
        }
    }
    if let (Some(max), Some(users)) = (guardrails.max_users, usage.users_count) {
        if users > max {
            return UsageValidation::limit(format!(
                "User limit reached ({}). Upgrade to add more users.",
                max
            ));
        }
    }
    if let (Some(max), Some(created)) = (guardrails.max_scenarios, usage.scenarios_created) {
        if created > 0 && created >= max {
            return UsageValidation::limit(format!(
                "Scenario limit reached ({}). Upgrade for unlimited scenarios.",
                max
            ));
        }
    }

    UsageValidation::ok()
}

// --- Stripe -------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeTierMapping {
    pub tier_key: PricingTier,
    pub stripe_price_id: Option<String>,
    pub stripe_mode: CheckoutMode,
    pub success_redirect: String,
    pub cancel_redirect: String,
    pub tier_name: &'static str,
    pub tier_price: u32,
}

/// 価格IDは設定 (STRIPE_PRICE_<TIER>) から与える
pub fn stripe_mapping(tier: PricingTier, price_id: Option<&str>) -> StripeTierMapping {
    let config = tier.config();
    let cancel_redirect = if tier.is_ai_tier() {
        "/ai-readiness/pricing"
    } else {
        "/pricing"
    };
    StripeTierMapping {
        tier_key: tier,
        stripe_price_id: price_id.map(str::to_string),
        stripe_mode: if tier == PricingTier::MonthlySubscription {
            CheckoutMode::Subscription
        } else {
            CheckoutMode::Payment
        },
        success_redirect: format!(
            "/assessment/tier-based?tier={}&assessment_type={}",
            tier,
            tier.assessment_type()
        ),
        cancel_redirect: cancel_redirect.to_string(),
        tier_name: config.name,
        tier_price: config.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for tier in PricingTier::all() {
            assert_eq!(tier.as_str().parse::<PricingTier>(), Ok(tier));
            assert_eq!(tier.to_string(), tier.as_str());
        }
        assert!("premium".parse::<PricingTier>().is_err());
        assert_eq!(
            serde_json::to_string(&PricingTier::HigherEdAiPulseCheck).unwrap(),
            "\"higher-ed-ai-pulse-check\""
        );
    }

    #[test]
    fn test_question_counts() {
        let counts: Vec<u32> = PricingTier::all()
            .iter()
            .map(|t| t.config().assessment_scope.question_count)
            .collect();
        assert_eq!(counts, vec![50, 105, 150, 200, 100, 120, 150, 200]);
    }

    #[test]
    fn test_available_algorithms_union() {
        assert_eq!(
            PricingTier::EnterpriseTransformation.available_algorithms(),
            vec![
                "OCI",
                "HOCI",
                "JCI",
                "DSCH",
                "CRF",
                "LEI",
                "Monte Carlo DSCH",
                "Predictive Analytics",
                "ROI Modeling",
                "AI-Powered Recommendations",
                "Real-time Benchmarking",
            ]
        );
        assert_eq!(
            PricingTier::HigherEdAiPulseCheck.available_algorithms(),
            vec!["AIRIX"]
        );
    }

    #[test]
    fn test_features() {
        assert!(PricingTier::OneTimeDiagnostic.has_feature(TierFeature::OrgChartGenerator));
        assert!(!PricingTier::OneTimeDiagnostic.has_feature(TierFeature::ScenarioBuilder));
        assert!(PricingTier::EnterpriseTransformation.has_feature(TierFeature::MonteCarloSimulation));
        assert!(!PricingTier::EnterpriseTransformation.has_feature(TierFeature::AiReadinessScore));

        let caps = PricingTier::ComprehensivePackage.org_chart_capabilities();
        assert!(caps.can_generate && caps.can_model_scenarios && caps.can_collaborate);
        assert_eq!(caps.max_scenarios, Some(5));
    }

    #[test]
    fn test_industry_sections() {
        // min(45, 50 * .3) = 15 -> 2 セクション
        assert_eq!(
            industry_sections("higher-education", PricingTier::HigherEdAiPulseCheck),
            vec!["Academic Programs & Curriculum", "Faculty & Instructional Support"]
        );
        // min(40, 60) = 40 -> 4 セクション
        assert_eq!(
            industry_sections("healthcare", PricingTier::EnterpriseTransformation).len(),
            4
        );
        assert!(industry_sections("retail", PricingTier::OneTimeDiagnostic).is_empty());
    }

    #[test]
    fn test_validate_usage_messages() {
        let over_assessments = validate_usage(
            PricingTier::OneTimeDiagnostic,
            &TierUsage {
                assessments_used: Some(2),
                ..Default::default()
            },
        );
        assert!(!over_assessments.valid);
        assert_eq!(
            over_assessments.message.as_deref(),
            Some("Assessment limit reached (1). Upgrade to continue.")
        );
        assert_eq!(over_assessments.upgrade_required, Some(true));

        let over_users = validate_usage(
            PricingTier::MonthlySubscription,
            &TierUsage {
                users_count: Some(6),
                ..Default::default()
            },
        );
        assert_eq!(
            over_users.message.as_deref(),
            Some("User limit reached (5). Upgrade to add more users.")
        );

        let at_scenarios = validate_usage(
            PricingTier::ComprehensivePackage,
            &TierUsage {
                scenarios_created: Some(5),
                ..Default::default()
            },
        );
        assert_eq!(
            at_scenarios.message.as_deref(),
            Some("Scenario limit reached (5). Upgrade for unlimited scenarios.")
        );

        let unlimited = validate_usage(
            PricingTier::EnterpriseTransformation,
            &TierUsage {
                assessments_used: Some(1000),
                users_count: Some(1000),
                scenarios_created: Some(1000),
            },
        );
        assert!(unlimited.valid);
        assert_eq!(unlimited.message, None);
    }

    #[test]
    fn test_stripe_mapping() {
        let monthly = stripe_mapping(PricingTier::MonthlySubscription, Some("price_123"));
        assert_eq!(monthly.stripe_mode, CheckoutMode::Subscription);
        assert_eq!(monthly.stripe_price_id.as_deref(), Some("price_123"));
        assert_eq!(
            monthly.success_redirect,
            "/assessment/tier-based?tier=monthly-subscription&assessment_type=organizational"
        );

        let pulse = stripe_mapping(PricingTier::HigherEdAiPulseCheck, None);
        assert_eq!(pulse.stripe_mode, CheckoutMode::Payment);
        assert_eq!(pulse.cancel_redirect, "/ai-readiness/pricing");
        assert_eq!(pulse.tier_price, 2000);
    }

    #[test]
    fn test_ai_tier_hierarchy() {
        assert!(PricingTier::AiEnterprisePartnership
            .has_ai_tier_access(PricingTier::AiReadinessComprehensive));
        assert!(!PricingTier::HigherEdAiPulseCheck
            .has_ai_tier_access(PricingTier::AiTransformationBlueprint));
        assert!(PricingTier::OneTimeDiagnostic.has_ai_tier_access(PricingTier::OneTimeDiagnostic));
        assert!(!PricingTier::EnterpriseTransformation
            .has_ai_tier_access(PricingTier::HigherEdAiPulseCheck));
    }
}
