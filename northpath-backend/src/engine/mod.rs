// northpath-backend/src/engine/mod.rs

//! I/O を持たない算出ロジック群

pub mod ai_readiness;
pub mod cost;
pub mod dsch;
pub mod org_chart;
pub mod question_filter;
pub mod response;
pub mod roi;
pub mod scenario;
pub mod scoring;
pub mod stats;
