pub mod ai;
pub mod dashboard;

pub use dashboard::{load_config_default, load_config_from, DashboardConfig, PipelineOptions};
