// northpath-backend/src/domain/mod.rs
pub mod assessment_collaborator_model;
pub mod assessment_comment_model;
pub mod assessment_model;
pub mod assessment_status;
pub mod feature_flag;
pub mod org_chart_model;
pub mod payment_history_model;
pub mod pricing_tier;
pub mod roi_calculation_model;
pub mod scenario_model;
pub mod team_invitation_model;
pub mod team_member_model;
pub mod team_model;
