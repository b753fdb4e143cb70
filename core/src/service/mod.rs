pub mod config_service;
pub mod log_query;
pub mod log_service;
pub mod policy;
pub mod transfer_service;
