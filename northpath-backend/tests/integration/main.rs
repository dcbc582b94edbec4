// tests/integration/main.rs

#[path = "../common/mod.rs"]
mod common;

mod access_tests;
mod analysis_tests;
mod assessment_tests;
mod catalogue_tests;
mod chart_tests;
mod collaboration_tests;
mod report_tests;
mod scenario_tests;
mod team_tests;
