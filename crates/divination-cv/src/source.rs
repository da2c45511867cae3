//! Frame sources backed by screenshots
//!
//! Live screen capture is provided by the embedding application through
//! [`FrameSource`]. The sources here crop a region out of a full-screen
//! image that is already in memory or on disk.

use crate::frame::Frame;
use crate::traits::FrameSource;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use divination_core::Region;
use image::RgbImage;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("region {region:?} lies outside the {width}x{height} screen image")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("no screenshots found in {0:?}")]
    NoFrames(PathBuf),
}

/// Cut a region out of a full-screen image
pub fn crop_region(screen: &RgbImage, region: &Region) -> Result<RgbImage> {
    let (width, height) = screen.dimensions();
    let fits = !region.is_empty()
        && region.x >= 0
        && region.y >= 0
        && region.x as i64 + region.width as i64 <= width as i64
        && region.y as i64 + region.height as i64 <= height as i64;

    if !fits {
        return Err(SourceError::RegionOutOfBounds {
            region: *region,
            width,
            height,
        }
        .into());
    }

    Ok(image::imageops::crop_imm(
        screen,
        region.x as u32,
        region.y as u32,
        region.width as u32,
        region.height as u32,
    )
    .to_image())
}

/// A screenshot held in memory
#[derive(Debug, Clone)]
pub struct ScreenImageSource {
    screen: RgbImage,
}

impl ScreenImageSource {
    pub fn new(screen: RgbImage) -> Self {
        Self { screen }
    }

    pub fn screen(&self) -> &RgbImage {
        &self.screen
    }
}

impl FrameSource for ScreenImageSource {
    fn capture(&mut self, region: &Region) -> Result<Frame> {
        Frame::from_rgb(&crop_region(&self.screen, region)?)
    }
}

/// Re-reads a screenshot file on every capture
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self, region: &Region) -> Result<Frame> {
        let screen = ImageUtils::load_rgb(&self.path)?;
        let cropped = crop_region(&screen, region)
            .with_context(|| format!("Cannot capture from {:?}", self.path))?;
        Frame::from_rgb(&cropped)
    }
}

/// Cycles through a list of screenshot files, one per capture
#[derive(Debug, Clone)]
pub struct ReplaySource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ReplaySource {
    const SUPPORTED_EXTENSIONS: [&'static str; 4] = ["png", "jpg", "jpeg", "bmp"];

    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    /// Collect every supported image in a directory, sorted by file name
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if let Some(extension) = path.extension() {
                let ext = extension.to_string_lossy().to_lowercase();
                if Self::SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                    paths.push(path);
                }
            }
        }

        if paths.is_empty() {
            return Err(SourceError::NoFrames(dir.to_path_buf()).into());
        }

        paths.sort();
        debug!("Replaying {} screenshots from {:?}", paths.len(), dir);
        Ok(Self::new(paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn capture(&mut self, region: &Region) -> Result<Frame> {
        if self.paths.is_empty() {
            return Err(SourceError::NoFrames(PathBuf::new()).into());
        }

        let path = &self.paths[self.next % self.paths.len()];
        self.next = (self.next + 1) % self.paths.len();
        ImageFileSource::new(path).capture(region)
    }
}
