//! High-level detection module

pub mod config;
pub mod detector;

pub use config::DebugConfig;
pub use detector::{DetectionReport, Detector};
