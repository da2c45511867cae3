//! Harvest / convert state machine

use super::camera::CameraController;
use super::input::InputDriver;
use crate::config::{seconds, BotConfig};
use anyhow::{Context, Result};
use divination_core::{Detection, ObjectClass};
use divination_cv::{Detector, FrameSource};
use log::{info, warn};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};

/// Looks for one object class in the current view
pub trait Scanner {
    fn scan(&mut self, class: ObjectClass) -> Result<Option<Detection>>;
}

/// Pairs a wisp and a rift detector with the frame source they read from
pub struct FrameScanner<S: FrameSource> {
    wisp: Detector,
    rift: Detector,
    source: S,
}

impl<S: FrameSource> FrameScanner<S> {
    pub fn new(wisp: Detector, rift: Detector, source: S) -> Self {
        Self { wisp, rift, source }
    }
}

impl<S: FrameSource> Scanner for FrameScanner<S> {
    fn scan(&mut self, class: ObjectClass) -> Result<Option<Detection>> {
        let detector = match class {
            ObjectClass::Wisp => &self.wisp,
            ObjectClass::Rift => &self.rift,
        };
        detector
            .detect(&mut self.source)
            .with_context(|| format!("{} detection failed", class))
    }
}

/// What a single loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No wisp in view; the camera was rotated
    NoWisp,
    /// A wisp was harvested and no rift trip was due
    Harvested,
    /// A wisp was harvested and memories were converted at a rift
    Converted,
    /// A rift trip was due but no rift turned up within the attempt limit
    RiftNotFound,
}

pub struct BotController<S, I, R> {
    scanner: S,
    input: I,
    rng: R,
    camera: CameraController,
    config: BotConfig,
    harvest_count: u32,
    harvests_before_rift: u32,
    total_harvests: u64,
}

impl<S, I, R> BotController<S, I, R>
where
    S: Scanner,
    I: InputDriver,
    R: Rng,
{
    pub fn new(scanner: S, input: I, rng: R, camera: CameraController, config: BotConfig) -> Self {
        let harvests_before_rift = config.initial_harvests_before_rift;
        Self {
            scanner,
            input,
            rng,
            camera,
            config,
            harvest_count: 0,
            harvests_before_rift,
            total_harvests: 0,
        }
    }

    /// Harvests since the last conversion
    pub fn harvest_count(&self) -> u32 {
        self.harvest_count
    }

    /// Harvests required before the next rift trip
    pub fn harvests_before_rift(&self) -> u32 {
        self.harvests_before_rift
    }

    pub fn total_harvests(&self) -> u64 {
        self.total_harvests
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Run one iteration of the loop
    pub fn step(&mut self) -> Result<StepOutcome> {
        let Some(wisp) = self.scanner.scan(ObjectClass::Wisp)? else {
            info!("No wisps found, rotating camera");
            self.rotate_camera()?;
            self.pause_secs("bot.delay_when_no_wisp", self.config.delay_when_no_wisp)?;
            return Ok(StepOutcome::NoWisp);
        };

        self.harvest(&wisp)?;

        if self.harvest_count < self.harvests_before_rift {
            return Ok(StepOutcome::Harvested);
        }

        if self.search_rift()? {
            Ok(StepOutcome::Converted)
        } else {
            Ok(StepOutcome::RiftNotFound)
        }
    }

    /// Loop until `stop` is set or `max_steps` iterations ran.
    /// Returns the number of iterations performed.
    pub fn run(&mut self, stop: &AtomicBool, max_steps: Option<u64>) -> Result<u64> {
        info!("Starting divination loop");
        let mut steps = 0;
        while !stop.load(Ordering::SeqCst) && max_steps.map_or(true, |max| steps < max) {
            self.step()?;
            steps += 1;
        }
        info!(
            "Loop stopped after {} steps, total harvests completed: {}",
            steps, self.total_harvests
        );
        Ok(steps)
    }

    fn harvest(&mut self, wisp: &Detection) -> Result<()> {
        let hold = self.config.click_duration.sample(&mut self.rng)?;
        info!("Clicking {}", wisp);
        self.input.move_and_click(wisp.point(), hold)?;

        let harvest_time = self.config.harvest_time.sample(&mut self.rng)?;
        info!("Harvesting for {:.1} seconds", harvest_time.as_secs_f64());
        self.input.pause(harvest_time);

        self.harvest_count += 1;
        self.total_harvests += 1;
        info!("Completed harvest #{}", self.harvest_count);
        Ok(())
    }

    fn search_rift(&mut self) -> Result<bool> {
        info!(
            "Time to convert at rift (after {} harvests)",
            self.harvest_count
        );
        let attempts = self.config.max_rift_attempts;

        for attempt in 1..=attempts {
            info!("Looking for energy rift (attempt {}/{})", attempt, attempts);
            if let Some(rift) = self.scanner.scan(ObjectClass::Rift)? {
                self.convert(&rift)?;
                return Ok(true);
            }
            info!("Energy rift not found, rotating camera");
            self.rotate_camera()?;
            self.pause_secs("bot.delay_after_rotation", self.config.delay_after_rotation)?;
        }

        warn!(
            "Could not find energy rift after {} attempts, continuing with wisp harvesting",
            attempts
        );
        Ok(false)
    }

    fn convert(&mut self, rift: &Detection) -> Result<()> {
        let hold = self.config.click_duration.sample(&mut self.rng)?;
        info!("Clicking {}", rift);
        self.input.move_and_click(rift.point(), hold)?;

        let convert_time = self.config.convert_time.sample(&mut self.rng)?;
        info!("Converting memories for {:.1} seconds", convert_time.as_secs_f64());
        self.input.pause(convert_time);

        self.harvest_count = 0;
        self.harvests_before_rift = self.config.subsequent_harvests_before_rift;
        info!("Next rift visit after {} harvests", self.harvests_before_rift);
        Ok(())
    }

    fn rotate_camera(&mut self) -> Result<()> {
        self.camera.rotate(&mut self.input, &mut self.rng, None, None)?;
        Ok(())
    }

    fn pause_secs(&mut self, name: &'static str, secs: f64) -> Result<()> {
        self.input.pause(seconds(name, secs)?);
        Ok(())
    }
}
