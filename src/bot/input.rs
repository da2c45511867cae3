//! Input backends

use crate::config::TimingError;
use anyhow::Result;
use divination_core::ScreenPoint;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Camera rotation direction, mapped to a held key by the input backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn key(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mouse and keyboard actions the bot needs
pub trait InputDriver {
    /// Move to `target` and hold the left button for `hold`
    fn move_and_click(&mut self, target: ScreenPoint, hold: Duration) -> Result<()>;

    /// Hold the key for `direction` for `hold`
    fn hold_key(&mut self, direction: Direction, hold: Duration) -> Result<()>;

    /// Wait without input
    fn pause(&mut self, duration: Duration);
}

/// Logs every action and sleeps instead of touching real devices
#[derive(Debug, Clone)]
pub struct DryRunInput {
    time_scale: f64,
}

impl DryRunInput {
    pub fn new() -> Self {
        Self { time_scale: 1.0 }
    }

    /// Multiply every wait by `scale`; `0.0` skips sleeping entirely
    pub fn with_time_scale(mut self, scale: f64) -> Result<Self, TimingError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(TimingError::InvalidScale(scale));
        }
        self.time_scale = scale;
        Ok(self)
    }

    fn sleep(&self, duration: Duration) {
        match Duration::try_from_secs_f64(duration.as_secs_f64() * self.time_scale) {
            Ok(scaled) if !scaled.is_zero() => std::thread::sleep(scaled),
            Ok(_) => {}
            Err(_) => warn!(
                "wait of {:.2}s scaled by {} is out of range, skipping",
                duration.as_secs_f64(),
                self.time_scale
            ),
        }
    }
}

impl Default for DryRunInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDriver for DryRunInput {
    fn move_and_click(&mut self, target: ScreenPoint, hold: Duration) -> Result<()> {
        info!(
            "click at ({}, {}) for {:.2}s",
            target.x,
            target.y,
            hold.as_secs_f64()
        );
        self.sleep(hold);
        Ok(())
    }

    fn hold_key(&mut self, direction: Direction, hold: Duration) -> Result<()> {
        info!("hold '{}' for {:.2}s", direction, hold.as_secs_f64());
        self.sleep(hold);
        Ok(())
    }

    fn pause(&mut self, duration: Duration) {
        self.sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_direction_serde_names() -> Result<()> {
        let json = serde_json::to_string(&vec![Direction::Left, Direction::Down])?;
        assert_eq!(json, r#"["left","down"]"#);
        let parsed: Direction = serde_json::from_str(r#""up""#)?;
        assert_eq!(parsed, Direction::Up);
        Ok(())
    }

    #[test]
    fn test_zero_time_scale_does_not_sleep() -> Result<()> {
        let mut input = DryRunInput::new().with_time_scale(0.0)?;
        let start = Instant::now();
        input.move_and_click(ScreenPoint::new(1, 2), Duration::from_secs(5))?;
        input.hold_key(Direction::Left, Duration::from_secs(5))?;
        input.pause(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn test_time_scale_must_be_finite() {
        assert!(DryRunInput::new().with_time_scale(f64::INFINITY).is_err());
        assert!(DryRunInput::new().with_time_scale(f64::NAN).is_err());
        assert!(DryRunInput::new().with_time_scale(-1.0).is_err());
    }

    #[test]
    fn test_oversized_scaled_wait_is_skipped() -> Result<()> {
        let mut input = DryRunInput::new().with_time_scale(1e300)?;
        let start = Instant::now();
        input.pause(Duration::from_secs(60));
        assert!(start.elapsed() < Duration::from_secs(1));
        Ok(())
    }
}
