// northpath-backend/src/service/mod.rs
pub mod analysis_service;
pub mod analytics_service;
pub mod assessment_service;
pub mod chart_service;
pub mod collaboration_service;
pub mod feature_flag_service;
pub mod payment_service;
pub mod report_service;
pub mod scenario_service;
pub mod subscription_service;
pub mod team_service;
