//! Conversions between `image` buffers and OpenCV matrices

use crate::Result;
use anyhow::{bail, Context};
use opencv::{
    core::{Mat, Vector, CV_8UC1, CV_8UC3},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load an image file as RGB
    pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<image::RgbImage> {
        let img = image::open(&path)
            .with_context(|| format!("Failed to open image: {:?}", path.as_ref()))?;
        Ok(img.to_rgb8())
    }

    /// Convert image::RgbImage to a BGR OpenCV Mat
    pub fn rgb_to_mat(rgb_image: &image::RgbImage) -> Result<Mat> {
        let (width, height) = rgb_image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Mat::default());
        }

        let rgb = Mat::from_slice(rgb_image.as_raw().as_slice())?
            .reshape(3, height as i32)?
            .try_clone()
            .context("Failed to wrap RGB buffer as Mat")?;

        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)
            .context("RGB to BGR conversion failed")?;
        Ok(bgr)
    }

    /// Convert a BGR OpenCV Mat to image::RgbImage
    pub fn mat_to_rgb(mat: &Mat) -> Result<image::RgbImage> {
        if mat.typ() != CV_8UC3 {
            bail!("Expected an 8-bit 3-channel Mat, got type {}", mat.typ());
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(mat, &mut rgb, imgproc::COLOR_BGR2RGB)
            .context("BGR to RGB conversion failed")?;

        let data = rgb.data_bytes()?.to_vec();
        image::RgbImage::from_raw(mat.cols() as u32, mat.rows() as u32, data)
            .context("Mat buffer does not match its dimensions")
    }

    /// Convert a single-channel OpenCV Mat to image::GrayImage
    pub fn mat_to_gray(mat: &Mat) -> Result<image::GrayImage> {
        if mat.typ() != CV_8UC1 {
            bail!("Expected an 8-bit single-channel Mat, got type {}", mat.typ());
        }

        let gray = if mat.is_continuous() {
            mat.data_bytes()?.to_vec()
        } else {
            mat.try_clone()?.data_bytes()?.to_vec()
        };

        image::GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, gray)
            .context("Mat buffer does not match its dimensions")
    }

    /// Save Mat as image, through the image crate when the layout allows it
    pub fn save_image<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let path = path.as_ref();

        let saved = match mat.typ() {
            CV_8UC3 => Self::mat_to_rgb(mat)?.save(path).map(|_| true),
            CV_8UC1 => Self::mat_to_gray(mat)?.save(path).map(|_| true),
            _ => Ok(false),
        }
        .with_context(|| format!("Failed to save image: {:?}", path))?;

        if !saved {
            // Fallback to OpenCV encoding
            let path_str = path.to_string_lossy();
            imgcodecs::imwrite(&path_str, mat, &Vector::new())
                .with_context(|| format!("Failed to save image: {}", path_str))?;
        }

        Ok(())
    }
}
