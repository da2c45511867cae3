//! Harvest loop driving the detectors through an input backend

pub mod camera;
pub mod controller;
pub mod input;

pub use camera::CameraController;
pub use controller::{BotController, FrameScanner, Scanner, StepOutcome};
pub use input::{Direction, DryRunInput, InputDriver};
