//! Analyzed contour candidates and detection results

use crate::geometry::{BoundingBox, Contour, LocalPoint, Region, ScreenPoint};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// The two object classes the detectors look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Wisp,
    Rift,
}

impl ObjectClass {
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectClass::Wisp => "wisp",
            ObjectClass::Rift => "rift",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ObjectClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wisp" => Ok(ObjectClass::Wisp),
            "rift" => Ok(ObjectClass::Rift),
            other => Err(format!("unknown object class '{}'", other)),
        }
    }
}

/// Isoperimetric ratio `4πA / P²`, 1.0 for a perfect circle.
///
/// A contour with no perimeter has circularity 0.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter > 0.0 {
        4.0 * PI * area / (perimeter * perimeter)
    } else {
        0.0
    }
}

/// One contour with its geometric and color properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub aspect_ratio: f64,
    pub center: LocalPoint,
    pub bounding_box: BoundingBox,
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
    #[serde(skip)]
    pub contour: Contour,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

impl Candidate {
    /// Build a candidate from raw measurements.
    ///
    /// `mean_hsv` is the per-channel mean over the filled contour.
    pub fn from_measurements(
        contour: Contour,
        area: f64,
        perimeter: f64,
        bounding_box: BoundingBox,
        mean_hsv: [f64; 3],
    ) -> Self {
        Self {
            area,
            perimeter,
            circularity: circularity(area, perimeter),
            aspect_ratio: bounding_box.aspect_ratio(),
            center: bounding_box.center(),
            bounding_box,
            hue: mean_hsv[0],
            saturation: mean_hsv[1],
            value: mean_hsv[2],
            contour,
            rejection: None,
        }
    }

    /// Attach a rejection reason
    pub fn rejected(mut self, reason: String) -> Self {
        self.rejection = Some(reason);
        self
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

/// Externally visible result of one detection call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub class: ObjectClass,
    pub screen_x: i32,
    pub screen_y: i32,
}

impl Detection {
    /// Place a candidate's local center into screen space
    pub fn locate(class: ObjectClass, candidate: &Candidate, region: &Region) -> Self {
        let screen = region.to_screen(candidate.center);
        Self {
            class,
            screen_x: screen.x,
            screen_y: screen.y,
        }
    }

    pub fn point(&self) -> ScreenPoint {
        ScreenPoint::new(self.screen_x, self.screen_y)
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.class, self.screen_x, self.screen_y)
    }
}
