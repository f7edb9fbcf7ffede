pub mod config;
pub mod logger;
pub mod models;

pub use config::{AppConfig, ConfigError, ExecutionMode, RiskLimits};
