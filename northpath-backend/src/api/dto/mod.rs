// northpath-backend/src/api/dto/mod.rs
pub mod analysis_dto;
pub mod analytics_dto;
pub mod assessment_dto;
pub mod chart_dto;
pub mod payment_dto;
pub mod report_dto;
pub mod scenario_dto;
pub mod team_dto;
pub mod tier_dto;
