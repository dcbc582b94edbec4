// northpath-backend/src/config.rs
pub mod app;
pub mod stripe;

pub use app::*;
