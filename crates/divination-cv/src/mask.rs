//! HSV range thresholding and morphological cleanup

use crate::Result;
use anyhow::Context;
use divination_core::{DetectionSettings, HsvRange, MorphKind, MorphOp};
use opencv::{
    core::{self, Mat, Point, Scalar, CV_8UC1},
    imgproc,
    prelude::*,
};

/// Builds binary masks from HSV frames
pub struct MaskBuilder;

impl MaskBuilder {
    /// Threshold then clean up, as configured
    pub fn build(hsv: &Mat, settings: &DetectionSettings) -> Result<Mat> {
        let mask = Self::threshold(hsv, &settings.range)?;
        Self::apply_morphology(&mask, &settings.morphology)
    }

    /// 255 where every channel lies inside the inclusive range, 0 elsewhere
    pub fn threshold(hsv: &Mat, range: &HsvRange) -> Result<Mat> {
        let lower = Scalar::new(
            range.lower[0] as f64,
            range.lower[1] as f64,
            range.lower[2] as f64,
            0.0,
        );
        let upper = Scalar::new(
            range.upper[0] as f64,
            range.upper[1] as f64,
            range.upper[2] as f64,
            0.0,
        );

        let mut mask = Mat::default();
        core::in_range(hsv, &lower, &upper, &mut mask).context("HSV range threshold failed")?;
        Ok(mask)
    }

    /// Apply each operation to the previous result, in order
    pub fn apply_morphology(mask: &Mat, operations: &[MorphOp]) -> Result<Mat> {
        let mut result = mask.try_clone()?;

        for op in operations {
            let kernel = Self::square_kernel(op.size)?;
            let mut next = Mat::default();
            imgproc::morphology_ex(
                &result,
                &mut next,
                Self::to_opencv(op.kind),
                &kernel,
                Point::new(-1, -1),
                1,
                core::BORDER_CONSTANT,
                imgproc::morphology_default_border_value()?,
            )
            .with_context(|| format!("Morphology {:?} {}x{} failed", op.kind, op.size, op.size))?;
            result = next;
        }

        Ok(result)
    }

    fn square_kernel(size: u32) -> Result<Mat> {
        let size = size as i32;
        Mat::new_rows_cols_with_default(size, size, CV_8UC1, Scalar::all(1.0))
            .context("Failed to allocate structuring element")
    }

    fn to_opencv(kind: MorphKind) -> i32 {
        match kind {
            MorphKind::Open => imgproc::MORPH_OPEN,
            MorphKind::Close => imgproc::MORPH_CLOSE,
            MorphKind::Erode => imgproc::MORPH_ERODE,
            MorphKind::Dilate => imgproc::MORPH_DILATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, CV_8UC3};

    fn count(mask: &Mat) -> Result<i32> {
        Ok(core::count_non_zero(mask)?)
    }

    fn blank(rows: i32, cols: i32) -> Result<Mat> {
        Ok(Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0))?)
    }

    #[test]
    fn test_threshold_is_inclusive() -> Result<()> {
        let mut hsv = Mat::new_rows_cols_with_default(1, 4, CV_8UC3, Scalar::all(0.0))?;
        let samples = [[85u8, 50, 50], [110, 255, 255], [84, 200, 200], [97, 49, 200]];
        for (col, sample) in samples.iter().enumerate() {
            let px = hsv.at_2d_mut::<core::Vec3b>(0, col as i32)?;
            px[0] = sample[0];
            px[1] = sample[1];
            px[2] = sample[2];
        }

        let mask = MaskBuilder::threshold(&hsv, &HsvRange::new([85, 50, 50], [110, 255, 255]))?;
        assert_eq!(*mask.at_2d::<u8>(0, 0)?, 255);
        assert_eq!(*mask.at_2d::<u8>(0, 1)?, 255);
        assert_eq!(*mask.at_2d::<u8>(0, 2)?, 0);
        assert_eq!(*mask.at_2d::<u8>(0, 3)?, 0);
        Ok(())
    }

    #[test]
    fn test_open_removes_specks() -> Result<()> {
        let mut mask = blank(40, 40)?;
        *mask.at_2d_mut::<u8>(5, 5)? = 255;
        imgproc::rectangle(
            &mut mask,
            Rect::new(20, 20, 10, 10),
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let cleaned = MaskBuilder::apply_morphology(&mask, &[MorphOp::open(3)])?;
        assert_eq!(*cleaned.at_2d::<u8>(5, 5)?, 0);
        assert_eq!(count(&cleaned)?, 100);
        Ok(())
    }

    #[test]
    fn test_close_joins_fragments() -> Result<()> {
        let mut mask = blank(60, 100)?;
        for x in [10, 46] {
            imgproc::rectangle(
                &mut mask,
                Rect::new(x, 20, 30, 20),
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        // 6px gap between the halves
        assert_eq!(*mask.at_2d::<u8>(30, 43)?, 0);
        let closed = MaskBuilder::apply_morphology(&mask, &[MorphOp::close(15)])?;
        assert_eq!(*closed.at_2d::<u8>(30, 43)?, 255);
        Ok(())
    }

    #[test]
    fn test_operation_order_matters() -> Result<()> {
        // Two 4px wide bars 3px apart: closing first merges them into a blob
        // that survives a 5x5 opening, opening first erases both.
        let mut mask = blank(30, 30)?;
        for x in [8, 15] {
            imgproc::rectangle(
                &mut mask,
                Rect::new(x, 10, 4, 8),
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        let close_then_open =
            MaskBuilder::apply_morphology(&mask, &[MorphOp::close(5), MorphOp::open(5)])?;
        let open_then_close =
            MaskBuilder::apply_morphology(&mask, &[MorphOp::open(5), MorphOp::close(5)])?;

        assert!(count(&close_then_open)? > 0);
        assert_eq!(count(&open_then_close)?, 0);
        Ok(())
    }

    #[test]
    fn test_erode_and_dilate() -> Result<()> {
        let mut mask = blank(20, 20)?;
        imgproc::rectangle(
            &mut mask,
            Rect::new(5, 5, 6, 6),
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let eroded = MaskBuilder::apply_morphology(&mask, &[MorphOp::new(MorphKind::Erode, 3)])?;
        assert_eq!(count(&eroded)?, 16);
        let dilated = MaskBuilder::apply_morphology(&mask, &[MorphOp::new(MorphKind::Dilate, 3)])?;
        assert_eq!(count(&dilated)?, 64);
        Ok(())
    }

    #[test]
    fn test_empty_mask_stays_empty() -> Result<()> {
        let mask = blank(32, 32)?;
        let settings = divination_core::RiftConfig::default().settings();
        let cleaned = MaskBuilder::apply_morphology(&mask, &settings.morphology)?;
        assert_eq!(count(&cleaned)?, 0);
        Ok(())
    }
}
