//! Captured frames

use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{core::Mat, imgproc, prelude::*};

/// Color raster of a region plus its HSV conversion.
///
/// Both rasters share dimensions. HSV uses the OpenCV 8-bit convention,
/// hue in `0..=180`.
#[derive(Debug)]
pub struct Frame {
    pub bgr: Mat,
    pub hsv: Mat,
}

impl Frame {
    /// Build a frame from an 8-bit BGR image
    pub fn from_bgr(bgr: Mat) -> Result<Self> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut hsv, imgproc::COLOR_BGR2HSV)
            .context("BGR to HSV conversion failed")?;
        Ok(Self { bgr, hsv })
    }

    /// Build a frame from an `image` crate RGB buffer
    pub fn from_rgb(rgb: &image::RgbImage) -> Result<Self> {
        Self::from_bgr(ImageUtils::rgb_to_mat(rgb)?)
    }

    pub fn width(&self) -> i32 {
        self.bgr.cols()
    }

    pub fn height(&self) -> i32 {
        self.bgr.rows()
    }
}
