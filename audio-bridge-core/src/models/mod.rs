pub mod config;
pub mod device_info;
pub mod error;
pub mod run_report;
pub mod state;
