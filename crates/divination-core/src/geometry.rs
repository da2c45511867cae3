//! Region, point and bounding box types
//!
//! Everything inside the detector works in region-local pixel coordinates;
//! [`Region::to_screen`] is the single place where they become absolute.

use serde::{Deserialize, Serialize};

/// Pixel coordinate relative to the top-left corner of a [`Region`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: i32,
    pub y: i32,
}

impl LocalPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Absolute screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fixed capture rectangle in absolute screen space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate a region-local point into screen coordinates
    pub fn to_screen(&self, local: LocalPoint) -> ScreenPoint {
        ScreenPoint::new(local.x + self.x, local.y + self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new(300, 300, 400, 400)
    }
}

/// Axis-aligned bounding rectangle of a contour, in local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width over height, or 0 for a box with no height
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            self.width as f64 / self.height as f64
        } else {
            0.0
        }
    }

    /// Pixel-grid center using floor division.
    ///
    /// This is not the centroid of the blob. Click targeting relies on this
    /// exact value.
    pub fn center(&self) -> LocalPoint {
        LocalPoint::new(
            self.x + self.width.div_euclid(2),
            self.y + self.height.div_euclid(2),
        )
    }
}

/// Outer boundary of one connected mask component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<LocalPoint>,
}

impl Contour {
    pub fn new(points: Vec<LocalPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalPoint> {
        self.points.iter()
    }
}

impl FromIterator<LocalPoint> for Contour {
    fn from_iter<T: IntoIterator<Item = LocalPoint>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
