pub mod config;
pub mod process;
pub mod service;
pub mod streaming;
pub mod telemetry;
