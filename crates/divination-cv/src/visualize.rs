//! Annotated debug rendering of a classification

use crate::analysis::to_cv_contour;
use crate::Result;
use anyhow::bail;
use divination_core::{Candidate, Classification, ObjectClass};
use opencv::{
    core::{Mat, Point, Scalar, Vector, CV_8UC3},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

const BLUE: (u8, u8, u8) = (0, 0, 255);
const GREEN: (u8, u8, u8) = (0, 255, 0);
const RED: (u8, u8, u8) = (255, 0, 0);

/// Get OpenCV color scalar (BGR format) from an RGB triple
fn bgr(color: (u8, u8, u8)) -> Scalar {
    Scalar::new(color.2 as f64, color.1 as f64, color.0 as f64, 255.0)
}

/// Colors for one object class
#[derive(Debug, Clone, Copy)]
struct Palette {
    accepted: (u8, u8, u8),
    rejected: (u8, u8, u8),
}

impl Palette {
    fn for_class(class: ObjectClass) -> Self {
        match class {
            ObjectClass::Wisp => Palette {
                accepted: GREEN,
                rejected: RED,
            },
            ObjectClass::Rift => Palette {
                accepted: RED,
                rejected: BLUE,
            },
        }
    }
}

/// Draws candidates onto a copy of the captured frame
#[derive(Debug, Clone, Copy)]
pub struct DebugVisualizer {
    pub font_scale: f64,
    /// Rift rejection reasons are drawn larger than other labels
    pub rejected_rift_font_scale: f64,
}

impl DebugVisualizer {
    pub fn new() -> Self {
        Self {
            font_scale: 0.3,
            rejected_rift_font_scale: 0.4,
        }
    }

    /// Render accepted and rejected candidates; the input frame is untouched
    pub fn render(&self, frame: &Mat, classification: &Classification) -> Result<Mat> {
        if frame.typ() != CV_8UC3 {
            bail!("Expected an 8-bit BGR frame, got type {}", frame.typ());
        }

        let mut output = frame.try_clone()?;
        let class = classification.class;
        let palette = Palette::for_class(class);

        for candidate in &classification.rejected {
            self.draw_rejected(&mut output, class, candidate, palette.rejected)?;
        }

        for (index, candidate) in classification.accepted.iter().enumerate() {
            self.draw_accepted(&mut output, class, index, candidate, palette.accepted)?;
        }

        Ok(output)
    }

    fn draw_rejected(
        &self,
        output: &mut Mat,
        class: ObjectClass,
        candidate: &Candidate,
        color: (u8, u8, u8),
    ) -> Result<()> {
        let center = Point::new(candidate.center.x, candidate.center.y);

        draw_contour(output, candidate, bgr(color), 1)?;
        if class == ObjectClass::Rift {
            imgproc::circle(output, center, 5, bgr(color), 2, LINE_8, 0)?;
        }

        let scale = match class {
            ObjectClass::Wisp => self.font_scale,
            ObjectClass::Rift => self.rejected_rift_font_scale,
        };
        let reason = candidate.rejection.as_deref().unwrap_or_default();
        label(output, reason, Point::new(center.x, center.y - 10), color, scale)
    }

    fn draw_accepted(
        &self,
        output: &mut Mat,
        class: ObjectClass,
        index: usize,
        candidate: &Candidate,
        color: (u8, u8, u8),
    ) -> Result<()> {
        let center = Point::new(candidate.center.x, candidate.center.y);
        let thickness = match class {
            ObjectClass::Wisp => 2,
            ObjectClass::Rift => 3,
        };

        draw_contour(output, candidate, bgr(color), thickness)?;
        imgproc::circle(output, center, 3, bgr(BLUE), imgproc::FILLED, LINE_8, 0)?;

        let label = match class {
            ObjectClass::Wisp => format!(
                "W{} A:{} C:{:.2} H:{}",
                index + 1,
                candidate.area as i64,
                candidate.circularity,
                candidate.hue as i64
            ),
            ObjectClass::Rift => format!(
                "RIFT A:{} H:{} V:{}",
                candidate.area as i64,
                candidate.hue as i64,
                candidate.value as i64
            ),
        };
        let origin = Point::new(center.x, center.y + 15);
        label(output, &label, origin, color, self.font_scale)
    }
}

impl Default for DebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

fn label(
    output: &mut Mat,
    text: &str,
    origin: Point,
    color: (u8, u8, u8),
    scale: f64,
) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    imgproc::put_text(
        output,
        text,
        origin,
        FONT_HERSHEY_SIMPLEX,
        scale,
        bgr(color),
        1,
        LINE_8,
        false,
    )?;
    Ok(())
}

fn draw_contour(
    output: &mut Mat,
    candidate: &Candidate,
    color: Scalar,
    thickness: i32,
) -> Result<()> {
    if candidate.contour.is_empty() {
        return Ok(());
    }

    let mut contours = Vector::<Vector<Point>>::new();
    contours.push(to_cv_contour(&candidate.contour));
    imgproc::draw_contours(
        output,
        &contours,
        -1,
        color,
        thickness,
        LINE_8,
        &Mat::default(),
        i32::MAX,
        Point::new(0, 0),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use divination_core::{BoundingBox, Contour, LocalPoint, RiftClassifier, WispClassifier};
    use opencv::core::{self, CV_8UC1};

    fn square_candidate(x: i32, y: i32, side: i32, area: f64) -> Candidate {
        let contour = Contour::new(vec![
            LocalPoint::new(x, y),
            LocalPoint::new(x, y + side),
            LocalPoint::new(x + side, y + side),
            LocalPoint::new(x + side, y),
        ]);
        Candidate::from_measurements(
            contour,
            area,
            4.0 * side as f64,
            BoundingBox::new(x, y, side + 1, side + 1),
            [95.0, 200.0, 200.0],
        )
    }

    #[test]
    fn test_render_leaves_frame_untouched() -> Result<()> {
        let frame = Mat::new_rows_cols_with_default(100, 100, CV_8UC3, Scalar::all(0.0))?;
        let classification = Classification::partition(
            &WispClassifier::default(),
            vec![
                square_candidate(10, 10, 15, 225.0),
                square_candidate(60, 60, 3, 9.0),
            ],
        );
        assert_eq!(classification.accepted.len(), 1);
        assert_eq!(classification.rejected.len(), 1);

        let annotated = DebugVisualizer::new().render(&frame, &classification)?;

        let ink = |mat: &Mat| -> Result<f64> {
            let sum = core::sum_elems(mat)?;
            Ok(sum[0] + sum[1] + sum[2])
        };
        assert_eq!(ink(&frame)?, 0.0);
        assert!(ink(&annotated)? > 0.0);
        assert_eq!((annotated.rows(), annotated.cols()), (100, 100));
        Ok(())
    }

    #[test]
    fn test_rejected_rift_labels_drawn_larger() -> Result<()> {
        let frame = Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::all(0.0))?;
        let rejected = Candidate::from_measurements(
            Contour::default(),
            400.0,
            80.0,
            BoundingBox::new(40, 50, 21, 21),
            [55.0, 200.0, 200.0],
        );
        let classification = Classification::partition(&RiftClassifier::default(), vec![rejected]);
        assert_eq!(classification.rejected.len(), 1);

        let ink = |visualizer: DebugVisualizer| -> Result<f64> {
            let sum = core::sum_elems(&visualizer.render(&frame, &classification)?)?;
            Ok(sum[0] + sum[1] + sum[2])
        };
        let uniform = DebugVisualizer {
            rejected_rift_font_scale: 0.3,
            ..DebugVisualizer::new()
        };
        assert!(ink(DebugVisualizer::new())? > ink(uniform)?);
        Ok(())
    }

    #[test]
    fn test_render_rejects_single_channel_frame() -> Result<()> {
        let mask = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0))?;
        let classification = Classification::partition(&WispClassifier::default(), Vec::new());
        assert!(DebugVisualizer::new().render(&mask, &classification).is_err());
        Ok(())
    }

    #[test]
    fn test_palettes_differ_per_class() {
        let wisp = Palette::for_class(ObjectClass::Wisp);
        let rift = Palette::for_class(ObjectClass::Rift);
        assert_ne!(wisp.accepted, wisp.rejected);
        assert_ne!(rift.accepted, rift.rejected);
        assert_ne!(wisp.accepted, rift.accepted);
    }
}
