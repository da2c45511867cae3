use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use divination::bot::{BotController, CameraController, DryRunInput, FrameScanner};
use divination::AppConfig;
use divination_core::{ObjectClass, Region};
use divination_cv::source::crop_region;
use divination_cv::utils::ImageUtils;
use divination_cv::{Detector, Frame, ReplaySource};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Wisp and energy rift detector")]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write debug images to this directory
    #[arg(long, global = true, conflicts_with = "no_debug")]
    debug_dir: Option<PathBuf>,

    /// Disable debug images
    #[arg(long, global = true)]
    no_debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect a single object class in a screenshot
    Detect {
        #[arg(long)]
        image: PathBuf,

        #[arg(long, value_enum)]
        class: ClassArg,

        /// Treat the whole image as the capture region
        #[arg(long)]
        full_frame: bool,

        /// Write the detection report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Run the harvest loop against recorded frames with simulated input
    Run {
        /// Directory of screenshots replayed in name order
        #[arg(long)]
        frames: PathBuf,

        #[arg(long)]
        max_steps: Option<u64>,

        /// Multiplier applied to every simulated wait
        #[arg(long, default_value_t = 1.0, value_parser = parse_time_scale)]
        time_scale: f64,

        /// Seed for randomized timings and camera directions
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as JSON
    DefaultConfig,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassArg {
    Wisp,
    Rift,
}

impl From<ClassArg> for ObjectClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Wisp => ObjectClass::Wisp,
            ClassArg::Rift => ObjectClass::Rift,
        }
    }
}

fn parse_time_scale(s: &str) -> std::result::Result<f64, String> {
    let scale: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if scale.is_finite() && scale >= 0.0 {
        Ok(scale)
    } else {
        Err(format!("expected a finite, non-negative number, got {}", scale))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.debug_dir {
        config.debug.enabled = true;
        config.debug.output_dir = dir.clone();
    }
    if args.no_debug {
        config.debug.enabled = false;
    }
    config.validate()?;

    match args.command {
        Command::Detect {
            image,
            class,
            full_frame,
            json,
        } => detect(&config, &image, class.into(), full_frame, json.as_deref()),
        Command::Run {
            frames,
            max_steps,
            time_scale,
            seed,
        } => run(&config, &frames, max_steps, time_scale, seed),
        Command::DefaultConfig => {
            println!("{}", AppConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn build_detector(config: &AppConfig, class: ObjectClass, region: Region) -> Result<Detector> {
    let detector = match class {
        ObjectClass::Wisp => Detector::wisp(config.wisp.clone(), region),
        ObjectClass::Rift => Detector::rift(config.rift.clone(), region),
    }
    .with_context(|| format!("Invalid {} configuration", class))?;
    Ok(detector.with_debug_config(&config.debug))
}

fn detect(
    config: &AppConfig,
    image: &Path,
    class: ObjectClass,
    full_frame: bool,
    json: Option<&Path>,
) -> Result<()> {
    let screen = ImageUtils::load_rgb(image)?;
    let region = if full_frame {
        Region::new(0, 0, screen.width() as i32, screen.height() as i32)
    } else {
        config.region
    };

    let detector = build_detector(config, class, region)?;
    let frame = Frame::from_rgb(&crop_region(&screen, &region)?)?;
    let report = detector.detect_frame(&frame)?;

    info!(
        "{} contours, {} accepted, {} rejected in {} ms",
        report.contour_count,
        report.classification.accepted.len(),
        report.classification.rejected.len(),
        report.processing_time_ms
    );
    match report.detection {
        Some(detection) => println!("{}", detection),
        None => println!("no {} detected", class),
    }

    if let Some(path) = json {
        report.export_json(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run(
    config: &AppConfig,
    frames: &Path,
    max_steps: Option<u64>,
    time_scale: f64,
    seed: Option<u64>,
) -> Result<()> {
    let source = ReplaySource::from_dir(frames)?;
    info!("Replaying {} frames from {:?}", source.len(), frames);

    let scanner = FrameScanner::new(
        build_detector(config, ObjectClass::Wisp, config.region)?,
        build_detector(config, ObjectClass::Rift, config.region)?,
        source,
    );
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut bot = BotController::new(
        scanner,
        DryRunInput::new().with_time_scale(time_scale)?,
        rng,
        CameraController::new(config.camera.clone()),
        config.bot.clone(),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;
    info!("Press Ctrl+C to stop");

    let steps = bot.run(&stop, max_steps)?;
    println!(
        "{} steps, {} harvests completed",
        steps,
        bot.total_harvests()
    );
    Ok(())
}
