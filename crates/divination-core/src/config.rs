//! Detector configuration
//!
//! Each detector is built from one immutable config value. The `Default`
//! impls carry the tuned constants for the wisp and rift detectors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at detector construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("HSV range channel {channel} has lower bound {lower} above upper bound {upper}")]
    InvertedRange { channel: usize, lower: u8, upper: u8 },
    #[error("morphology step {index} has an empty kernel")]
    EmptyKernel { index: usize },
    #[error("{name} bounds are inverted ({min} >= {max})")]
    InvertedBounds {
        name: &'static str,
        min: f64,
        max: f64,
    },
}

/// Inclusive per-channel HSV range, OpenCV 8-bit convention (H in 0..=180)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Check whether an HSV triple lies inside the range
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }

    /// Check whether any HSV triple satisfies both ranges
    pub fn intersects(&self, other: &HsvRange) -> bool {
        (0..3).all(|c| self.lower[c].max(other.lower[c]) <= self.upper[c].min(other.upper[c]))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for channel in 0..3 {
            if self.lower[channel] > self.upper[channel] {
                return Err(ConfigError::InvertedRange {
                    channel,
                    lower: self.lower[channel],
                    upper: self.upper[channel],
                });
            }
        }
        Ok(())
    }
}

/// Morphological operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphKind {
    /// Erosion then dilation, drops small specks
    Open,
    /// Dilation then erosion, fills gaps inside blobs
    Close,
    Erode,
    Dilate,
}

/// One morphology step with a square `size x size` structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphOp {
    pub kind: MorphKind,
    pub size: u32,
}

impl MorphOp {
    pub fn new(kind: MorphKind, size: u32) -> Self {
        Self { kind, size }
    }

    pub fn open(size: u32) -> Self {
        Self::new(MorphKind::Open, size)
    }

    pub fn close(size: u32) -> Self {
        Self::new(MorphKind::Close, size)
    }
}

/// Color prefilter plus mask cleanup shared by both detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSettings {
    pub range: HsvRange,
    /// Applied strictly in order
    pub morphology: Vec<MorphOp>,
}

impl DetectionSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.range.validate()?;
        for (index, op) in self.morphology.iter().enumerate() {
            if op.size == 0 {
                return Err(ConfigError::EmptyKernel { index });
            }
        }
        Ok(())
    }
}

/// Wisp detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WispConfig {
    pub lower_hsv: [u8; 3],
    pub upper_hsv: [u8; 3],
    pub min_area: f64,
    pub max_area: f64,
    pub min_circularity: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    pub morph_kernel_size: u32,
}

impl Default for WispConfig {
    fn default() -> Self {
        Self {
            lower_hsv: [85, 50, 50],
            upper_hsv: [110, 255, 255],
            min_area: 50.0,
            max_area: 1000.0,
            min_circularity: 0.3,
            min_aspect_ratio: 0.4,
            max_aspect_ratio: 2.5,
            morph_kernel_size: 3,
        }
    }
}

impl WispConfig {
    pub fn range(&self) -> HsvRange {
        HsvRange::new(self.lower_hsv, self.upper_hsv)
    }

    /// Open removes isolated specks, close then seals pinholes
    pub fn settings(&self) -> DetectionSettings {
        DetectionSettings {
            range: self.range(),
            morphology: vec![
                MorphOp::open(self.morph_kernel_size),
                MorphOp::close(self.morph_kernel_size),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_area >= self.max_area {
            return Err(ConfigError::InvertedBounds {
                name: "area",
                min: self.min_area,
                max: self.max_area,
            });
        }
        if self.min_aspect_ratio >= self.max_aspect_ratio {
            return Err(ConfigError::InvertedBounds {
                name: "aspect ratio",
                min: self.min_aspect_ratio,
                max: self.max_aspect_ratio,
            });
        }
        self.settings().validate()
    }
}

/// Energy rift detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiftConfig {
    pub lower_hsv: [u8; 3],
    pub upper_hsv: [u8; 3],
    pub min_area: f64,
    pub min_value: f64,
    pub min_saturation: f64,
    pub close_kernel_size: u32,
    pub open_kernel_size: u32,
}

impl Default for RiftConfig {
    fn default() -> Self {
        Self {
            lower_hsv: [40, 120, 150],
            upper_hsv: [70, 255, 255],
            min_area: 3000.0,
            min_value: 150.0,
            min_saturation: 100.0,
            close_kernel_size: 15,
            open_kernel_size: 5,
        }
    }
}

impl RiftConfig {
    pub fn range(&self) -> HsvRange {
        HsvRange::new(self.lower_hsv, self.upper_hsv)
    }

    /// Close first so a rift split by terrain is rejoined, then open away
    /// the bright specks closing kept.
    pub fn settings(&self) -> DetectionSettings {
        DetectionSettings {
            range: self.range(),
            morphology: vec![
                MorphOp::close(self.close_kernel_size),
                MorphOp::open(self.open_kernel_size),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings().validate()
    }
}
