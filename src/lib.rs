//! Wisp harvesting loop built on the divination detectors

pub mod bot;
pub mod config;

pub use config::AppConfig;
