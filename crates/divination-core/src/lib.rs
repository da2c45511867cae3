//! Divination core data model
//!
//! OpenCV-free types shared by the detection pipeline and the bot: screen
//! geometry, analyzed candidates, detector configuration and the wisp/rift
//! classifiers.

pub mod candidate;
pub mod classify;
pub mod config;
pub mod geometry;

pub use candidate::{Candidate, Detection, ObjectClass};
pub use classify::{Classification, Classifier, RiftClassifier, WispClassifier};
pub use config::{
    ConfigError, DetectionSettings, HsvRange, MorphKind, MorphOp, RiftConfig, WispConfig,
};
pub use geometry::{BoundingBox, Contour, LocalPoint, Region, ScreenPoint};
