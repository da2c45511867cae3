//! Contour extraction and per-contour shape/color analysis

use crate::Result;
use anyhow::Context;
use divination_core::{BoundingBox, Candidate, Contour, LocalPoint};
use opencv::{
    core::{self, Mat, Point, Scalar, Vector, CV_8UC1},
    imgproc::{self, CHAIN_APPROX_SIMPLE, RETR_EXTERNAL},
    prelude::*,
};

pub type CvContour = Vector<Point>;

/// Outer boundaries of the connected components of a binary mask.
///
/// Holes are not reported. The order is whatever OpenCV yields and carries
/// no meaning.
pub fn find_external_contours(mask: &Mat) -> Result<Vector<CvContour>> {
    let mut contours = Vector::<CvContour>::new();
    imgproc::find_contours(
        mask,
        &mut contours,
        RETR_EXTERNAL,
        CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )
    .context("Contour extraction failed")?;
    Ok(contours)
}

pub fn to_core_contour(contour: &CvContour) -> Contour {
    contour.iter().map(|p| LocalPoint::new(p.x, p.y)).collect()
}

pub fn to_cv_contour(contour: &Contour) -> CvContour {
    contour.iter().map(|p| Point::new(p.x, p.y)).collect()
}

/// Measures contours against the HSV raster they were found in
pub struct ContourAnalyzer<'a> {
    hsv: &'a Mat,
}

impl<'a> ContourAnalyzer<'a> {
    pub fn new(hsv: &'a Mat) -> Self {
        Self { hsv }
    }

    /// Analyze every contour, preserving extraction order
    pub fn analyze_all(&self, contours: &Vector<CvContour>) -> Result<Vec<Candidate>> {
        contours.iter().map(|contour| self.analyze(&contour)).collect()
    }

    pub fn analyze(&self, contour: &CvContour) -> Result<Candidate> {
        let area = imgproc::contour_area(contour, false)?;
        let perimeter = imgproc::arc_length(contour, true)?;
        let rect = imgproc::bounding_rect(contour)?;
        let mean_hsv = self.mean_hsv(contour)?;

        Ok(Candidate::from_measurements(
            to_core_contour(contour),
            area,
            perimeter,
            BoundingBox::new(rect.x, rect.y, rect.width, rect.height),
            mean_hsv,
        ))
    }

    /// Mean of each HSV channel over the filled contour only
    pub fn mean_hsv(&self, contour: &CvContour) -> Result<[f64; 3]> {
        let mut fill = Mat::new_rows_cols_with_default(
            self.hsv.rows(),
            self.hsv.cols(),
            CV_8UC1,
            Scalar::all(0.0),
        )?;

        let mut single = Vector::<CvContour>::new();
        single.push(contour.clone());
        imgproc::draw_contours(
            &mut fill,
            &single,
            -1,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            &Mat::default(),
            i32::MAX,
            Point::new(0, 0),
        )
        .context("Failed to rasterize contour mask")?;

        let mean = core::mean(self.hsv, &fill)?;
        Ok([mean[0], mean[1], mean[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use opencv::core::{Rect, CV_8UC3};

    fn mask_with_rects(rects: &[Rect]) -> Result<Mat> {
        let mut mask = Mat::new_rows_cols_with_default(100, 100, CV_8UC1, Scalar::all(0.0))?;
        for rect in rects {
            imgproc::rectangle(
                &mut mask,
                *rect,
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(mask)
    }

    #[test]
    fn test_empty_mask_has_no_contours() -> Result<()> {
        let mask = mask_with_rects(&[])?;
        assert!(find_external_contours(&mask)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_holes_are_not_reported() -> Result<()> {
        let mut mask = mask_with_rects(&[Rect::new(10, 10, 60, 60)])?;
        imgproc::rectangle(
            &mut mask,
            Rect::new(30, 30, 20, 20),
            Scalar::all(0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let contours = find_external_contours(&mask)?;
        assert_eq!(contours.len(), 1);
        Ok(())
    }

    #[test]
    fn test_rectangle_measurements() -> Result<()> {
        let mask = mask_with_rects(&[Rect::new(10, 20, 31, 11)])?;
        let hsv = Mat::new_rows_cols_with_default(
            100,
            100,
            CV_8UC3,
            Scalar::new(50.0, 200.0, 220.0, 0.0),
        )?;

        let contours = find_external_contours(&mask)?;
        assert_eq!(contours.len(), 1);
        let candidate = ContourAnalyzer::new(&hsv).analyze(&contours.get(0)?)?;

        // Contour runs through the outer pixel centers: 30 x 10
        assert_eq!(candidate.area, 300.0);
        assert_eq!(candidate.perimeter, 80.0);
        assert_eq!(candidate.bounding_box, BoundingBox::new(10, 20, 31, 11));
        assert_eq!(candidate.center, LocalPoint::new(25, 25));
        assert!((candidate.aspect_ratio - 31.0 / 11.0).abs() < 1e-12);
        let expected = 4.0 * std::f64::consts::PI * 300.0 / 6400.0;
        assert!((candidate.circularity - expected).abs() < 1e-12);
        assert_eq!(
            (candidate.hue, candidate.saturation, candidate.value),
            (50.0, 200.0, 220.0)
        );
        Ok(())
    }

    #[test]
    fn test_mean_hsv_ignores_pixels_outside_contour() -> Result<()> {
        // Bright disc on a dark frame: the bounding box of the disc
        // includes dark corners, the filled contour does not.
        let mut bgr = Mat::new_rows_cols_with_default(80, 80, CV_8UC3, Scalar::all(0.0))?;
        imgproc::circle(
            &mut bgr,
            Point::new(40, 40),
            15,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
        let frame = Frame::from_bgr(bgr)?;

        let mut mask = Mat::default();
        core::in_range(
            &frame.hsv,
            &Scalar::new(50.0, 100.0, 100.0, 0.0),
            &Scalar::new(70.0, 255.0, 255.0, 0.0),
            &mut mask,
        )?;
        let contours = find_external_contours(&mask)?;
        assert_eq!(contours.len(), 1);

        let candidate = ContourAnalyzer::new(&frame.hsv).analyze(&contours.get(0)?)?;
        assert_eq!(candidate.value, 255.0);
        assert_eq!(candidate.saturation, 255.0);
        assert_eq!(candidate.hue, 60.0);
        Ok(())
    }

    #[test]
    fn test_single_pixel_contour_is_degenerate() -> Result<()> {
        let mask = mask_with_rects(&[Rect::new(50, 50, 1, 1)])?;
        let hsv = Mat::new_rows_cols_with_default(100, 100, CV_8UC3, Scalar::all(0.0))?;

        let contours = find_external_contours(&mask)?;
        let candidate = ContourAnalyzer::new(&hsv).analyze(&contours.get(0)?)?;
        assert_eq!(candidate.area, 0.0);
        assert_eq!(candidate.perimeter, 0.0);
        assert_eq!(candidate.circularity, 0.0);
        assert_eq!(candidate.center, LocalPoint::new(50, 50));
        Ok(())
    }

    #[test]
    fn test_contour_conversion_round_trip() {
        let contour = Contour::new(vec![LocalPoint::new(1, 2), LocalPoint::new(3, 4)]);
        assert_eq!(to_core_contour(&to_cv_contour(&contour)), contour);
    }
}
