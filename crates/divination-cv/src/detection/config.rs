//! Debug output configuration

use crate::debug::FileDebugSink;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Controls whether detectors write debug rasters, and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    /// Prepended to every file name, for detectors sharing a directory
    pub prefix: Option<String>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: "debug".into(),
            prefix: None,
        }
    }
}

impl DebugConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// File sink for this configuration, `None` when disabled
    pub fn sink(&self) -> Option<FileDebugSink> {
        if !self.enabled {
            return None;
        }
        let sink = FileDebugSink::new(&self.output_dir);
        Some(match &self.prefix {
            Some(prefix) => sink.with_prefix(prefix.clone()),
            None => sink,
        })
    }
}
