// northpath-backend/src/api/handlers/mod.rs
pub mod admin_handler;
pub mod analysis_handler;
pub mod analytics_handler;
pub mod assessment_handler;
pub mod chart_handler;
pub mod collaboration_handler;
pub mod feature_handler;
pub mod payment_handler;
pub mod report_handler;
pub mod scenario_handler;
pub mod subscription_handler;
pub mod system_handler;
pub mod team_handler;
pub mod tier_handler;
