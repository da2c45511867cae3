//! Divination Computer Vision Library
//!
//! Color-threshold blob detection for wisps and energy rifts using OpenCV:
//! HSV range mask, morphology cleanup, external contours, shape and color
//! analysis, then a class-specific accept rule and maximum-area ranking.

pub mod analysis;
pub mod debug;
pub mod detection;
pub mod frame;
pub mod mask;
pub mod source;
pub mod utils;
pub mod visualize;

// Re-export commonly used types
pub use debug::{DebugArtifact, FileDebugSink};
pub use detection::{DebugConfig, DetectionReport, Detector};
pub use frame::Frame;
pub use mask::MaskBuilder;
pub use source::{ImageFileSource, ReplaySource, ScreenImageSource, SourceError};
pub use visualize::DebugVisualizer;

pub use divination_core::{Detection, ObjectClass, Region};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Seams between the detector and the outside world
pub mod traits {
    use super::*;
    use opencv::core::Mat;

    /// Produces the color and HSV rasters of one screen region
    pub trait FrameSource {
        fn capture(&mut self, region: &Region) -> Result<Frame>;
    }

    /// Receives debug rasters; never influences detection results
    pub trait DebugSink {
        fn save(&self, class: ObjectClass, artifact: DebugArtifact, image: &Mat) -> Result<()>;
    }
}

pub use traits::{DebugSink, FrameSource};
