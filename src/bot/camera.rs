//! Random camera rotation

use super::input::{Direction, InputDriver};
use crate::config::{seconds, CameraConfig};
use anyhow::Result;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

pub struct CameraController {
    config: CameraConfig,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Hold a direction key, then settle. A missing direction or duration is
    /// drawn from the configuration. Returns the direction used, `None` when
    /// nothing was given and no direction is configured.
    pub fn rotate<R: Rng + ?Sized>(
        &self,
        input: &mut dyn InputDriver,
        rng: &mut R,
        direction: Option<Direction>,
        hold: Option<Duration>,
    ) -> Result<Option<Direction>> {
        let direction = match direction {
            Some(direction) => direction,
            None => match self.config.directions.choose(rng) {
                Some(&direction) => direction,
                None => return Ok(None),
            },
        };
        let hold = match hold {
            Some(hold) => hold,
            None => self.config.rotation_duration.sample(rng)?,
        };
        self.rotate_toward(input, direction, hold)?;
        Ok(Some(direction))
    }

    pub fn rotate_toward(
        &self,
        input: &mut dyn InputDriver,
        direction: Direction,
        hold: Duration,
    ) -> Result<()> {
        info!(
            "rotating camera {} for {:.2}s",
            direction,
            hold.as_secs_f64()
        );
        input.hold_key(direction, hold)?;
        input.pause(seconds(
            "camera.delay_after_rotation",
            self.config.delay_after_rotation,
        )?);
        Ok(())
    }
}
