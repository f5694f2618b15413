pub mod config;
pub mod freshness;
pub mod log;
pub mod plugin;
pub mod report;
