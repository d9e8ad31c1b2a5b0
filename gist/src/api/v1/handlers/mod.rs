mod analyze;
mod health;

pub use analyze::{analyze_upload, AnalyzeData};
pub use health::{health_check, HealthData};
