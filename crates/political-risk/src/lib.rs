pub mod config;
pub mod error;
pub mod framework;
pub mod telemetry;
