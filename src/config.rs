//! Application configuration file

use crate::bot::Direction;
use anyhow::Context;
use divination_core::{Region, RiftConfig, WispConfig};
use divination_cv::DebugConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Timing values that cannot be turned into a wait
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimingError {
    #[error("{name}: {value} is not a finite, non-negative duration in seconds")]
    InvalidSeconds { name: &'static str, value: f64 },
    #[error("{name}: min {min} is greater than max {max}")]
    InvertedRange { name: &'static str, min: f64, max: f64 },
    #[error("time scale must be finite and non-negative, got {0}")]
    InvalidScale(f64),
}

/// Convert a configured number of seconds into a `Duration`
pub fn seconds(name: &'static str, value: f64) -> Result<Duration, TimingError> {
    Duration::try_from_secs_f64(value).map_err(|_| TimingError::InvalidSeconds { name, value })
}

/// Inclusive range of seconds a randomized wait is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondsRange {
    pub min: f64,
    pub max: f64,
}

impl SecondsRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, name: &'static str) -> Result<(), TimingError> {
        seconds(name, self.min)?;
        seconds(name, self.max)?;
        if self.min > self.max {
            return Err(TimingError::InvertedRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Duration, TimingError> {
        self.validate("range")?;
        let secs = if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        };
        seconds("range", secs)
    }
}

/// Harvest loop timing and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub harvest_time: SecondsRange,
    pub convert_time: SecondsRange,
    pub click_duration: SecondsRange,
    /// Harvests before the first trip to a rift
    pub initial_harvests_before_rift: u32,
    /// Harvests between later rift trips
    pub subsequent_harvests_before_rift: u32,
    pub max_rift_attempts: u32,
    pub delay_after_rotation: f64,
    pub delay_when_no_wisp: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            harvest_time: SecondsRange::new(20.0, 30.0),
            convert_time: SecondsRange::new(30.0, 40.0),
            click_duration: SecondsRange::new(0.3, 0.7),
            initial_harvests_before_rift: 2,
            subsequent_harvests_before_rift: 1,
            max_rift_attempts: 10,
            delay_after_rotation: 1.0,
            delay_when_no_wisp: 1.0,
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), TimingError> {
        self.harvest_time.validate("bot.harvest_time")?;
        self.convert_time.validate("bot.convert_time")?;
        self.click_duration.validate("bot.click_duration")?;
        seconds("bot.delay_after_rotation", self.delay_after_rotation)?;
        seconds("bot.delay_when_no_wisp", self.delay_when_no_wisp)?;
        Ok(())
    }
}

/// Camera rotation behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub rotation_duration: SecondsRange,
    pub delay_after_rotation: f64,
    pub directions: Vec<Direction>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotation_duration: SecondsRange::new(0.5, 1.5),
            delay_after_rotation: 0.5,
            directions: vec![
                Direction::Left,
                Direction::Right,
                Direction::Up,
                Direction::Down,
            ],
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), TimingError> {
        self.rotation_duration.validate("camera.rotation_duration")?;
        seconds("camera.delay_after_rotation", self.delay_after_rotation)?;
        Ok(())
    }
}

/// Everything the binary can be configured with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub region: Region,
    pub wisp: WispConfig,
    pub rift: RiftConfig,
    pub debug: DebugConfig,
    pub bot: BotConfig,
    pub camera: CameraConfig,
}

impl AppConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.wisp.validate()?;
        self.rift.validate()?;
        self.bot.validate()?;
        self.camera.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_json_round_trip() -> anyhow::Result<()> {
        let config = AppConfig::default();
        let parsed: AppConfig = serde_json::from_str(&config.to_json()?)?;
        assert_eq!(parsed, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "region": { "x": 0, "y": 0, "width": 800, "height": 600 },
                 "bot": { "max_rift_attempts": 3 },
                 "debug": { "enabled": false } }"#,
        )?;

        let config = AppConfig::load(&path)?;
        assert_eq!(config.region, Region::new(0, 0, 800, 600));
        assert_eq!(config.bot.max_rift_attempts, 3);
        assert_eq!(config.bot.initial_harvests_before_rift, 2);
        assert!(!config.debug.enabled);
        assert_eq!(config.wisp, WispConfig::default());
        Ok(())
    }

    #[test]
    fn test_seconds_range_sampling() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let range = SecondsRange::new(0.3, 0.7);
        for _ in 0..100 {
            let d = range.sample(&mut rng)?.as_secs_f64();
            assert!((0.3..=0.7).contains(&d));
        }
        assert_eq!(
            SecondsRange::new(2.0, 2.0).sample(&mut rng)?,
            Duration::from_secs(2)
        );
        Ok(())
    }

    #[test]
    fn test_sampling_rejects_unusable_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(SecondsRange::new(1e20, 1e20).sample(&mut rng).is_err());
        assert!(SecondsRange::new(0.0, f64::INFINITY).sample(&mut rng).is_err());
        assert!(SecondsRange::new(f64::NAN, 1.0).sample(&mut rng).is_err());
        assert_eq!(
            SecondsRange::new(3.0, 1.0).sample(&mut rng),
            Err(TimingError::InvertedRange {
                name: "range",
                min: 3.0,
                max: 1.0
            })
        );
    }

    #[test]
    fn test_bot_and_camera_validation() {
        assert!(BotConfig::default().validate().is_ok());
        assert!(CameraConfig::default().validate().is_ok());

        let bot = BotConfig {
            convert_time: SecondsRange::new(40.0, 30.0),
            ..Default::default()
        };
        assert!(matches!(
            bot.validate(),
            Err(TimingError::InvertedRange {
                name: "bot.convert_time",
                ..
            })
        ));

        let bot = BotConfig {
            delay_when_no_wisp: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bot.validate(),
            Err(TimingError::InvalidSeconds {
                name: "bot.delay_when_no_wisp",
                ..
            })
        ));

        let camera = CameraConfig {
            delay_after_rotation: f64::INFINITY,
            ..Default::default()
        };
        assert!(camera.validate().is_err());
    }

    #[test]
    fn test_load_rejects_overflowing_timings() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bot": { "harvest_time": { "min": 1e20, "max": 1e20 } } }"#)?;

        let err = AppConfig::load(&path).expect_err("overflowing harvest time must be rejected");
        let timing = err.downcast_ref::<TimingError>();
        assert!(matches!(
            timing,
            Some(TimingError::InvalidSeconds {
                name: "bot.harvest_time",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_load_rejects_inverted_detector_config() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "wisp": { "min_area": 900.0, "max_area": 100.0 } }"#)?;
        assert!(AppConfig::load(&path).is_err());
        Ok(())
    }
}
