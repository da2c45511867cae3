//! Debug image sinks

use crate::traits::DebugSink;
use crate::utils::ImageUtils;
use crate::Result;
use divination_core::ObjectClass;
use log::debug;
use opencv::core::Mat;
use std::fs;
use std::path::{Path, PathBuf};

/// The three rasters written per detection call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugArtifact {
    /// Captured color frame
    Original,
    /// Cleaned binary mask
    Mask,
    /// Frame with accepted/rejected candidates drawn on it
    Annotated,
}

impl DebugArtifact {
    /// File name used for a class/artifact pair
    pub fn file_name(&self, class: ObjectClass) -> &'static str {
        match (class, self) {
            (ObjectClass::Wisp, DebugArtifact::Original) => "original.png",
            (ObjectClass::Wisp, DebugArtifact::Mask) => "mask.png",
            (ObjectClass::Wisp, DebugArtifact::Annotated) => "detected_objects.png",
            (ObjectClass::Rift, DebugArtifact::Original) => "rift_original.png",
            (ObjectClass::Rift, DebugArtifact::Mask) => "rift_mask.png",
            (ObjectClass::Rift, DebugArtifact::Annotated) => "rift_detected.png",
        }
    }
}

/// Writes debug rasters into a directory.
///
/// Each call overwrites the previous images. Detectors running side by side
/// need distinct directories or prefixes.
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    dir: PathBuf,
    prefix: Option<String>,
}

impl FileDebugSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn path_for(&self, class: ObjectClass, artifact: DebugArtifact) -> PathBuf {
        let name = artifact.file_name(class);
        match &self.prefix {
            Some(prefix) => self.dir.join(format!("{}_{}", prefix, name)),
            None => self.dir.join(name),
        }
    }
}

impl DebugSink for FileDebugSink {
    fn save(&self, class: ObjectClass, artifact: DebugArtifact, image: &Mat) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(class, artifact);
        ImageUtils::save_image(image, &path)?;
        debug!("Saved {:?} debug image to {:?}", artifact, path);
        Ok(())
    }
}
