// northpath-backend/src/repository/mod.rs
pub mod assessment_collaborator_repository;
pub mod assessment_comment_repository;
pub mod assessment_repository;
pub mod org_chart_repository;
pub mod payment_history_repository;
pub mod scenario_repository;
pub mod team_invitation_repository;
pub mod team_repository;
