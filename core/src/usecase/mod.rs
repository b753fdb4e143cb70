pub mod analytics;
pub mod dashboard;
