//! Shared detection pipeline
//!
//! capture → HSV range mask → morphology → external contours → analysis →
//! class predicate → maximum rank key → screen coordinates.

use super::config::DebugConfig;
use crate::analysis::{find_external_contours, ContourAnalyzer, CvContour};
use crate::debug::DebugArtifact;
use crate::frame::Frame;
use crate::mask::MaskBuilder;
use crate::traits::{DebugSink, FrameSource};
use crate::visualize::DebugVisualizer;
use crate::Result;
use anyhow::Context;
use divination_core::{
    Candidate, Classification, Classifier, ConfigError, Detection, DetectionSettings,
    ObjectClass, Region, RiftClassifier, RiftConfig, WispClassifier, WispConfig,
};
use log::{debug, info, warn};
use opencv::core::{Mat, Vector};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Everything one pass over a frame produced
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub contour_count: usize,
    pub classification: Classification,
    pub detection: Option<Detection>,
    pub processing_time_ms: u64,
}

impl DetectionReport {
    pub fn best(&self) -> Option<&Candidate> {
        self.classification.best()
    }

    /// Export the report in JSON format
    pub fn export_json(&self, output_path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize detection report")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

/// Region detector for one object class.
///
/// Holds only immutable configuration; every call allocates its own frame,
/// mask and candidates.
pub struct Detector {
    classifier: Box<dyn Classifier + Send + Sync>,
    settings: DetectionSettings,
    region: Region,
    debug_sink: Option<Box<dyn DebugSink + Send + Sync>>,
    visualizer: DebugVisualizer,
}

impl Detector {
    /// Create a detector from any classifier
    pub fn new<C>(
        classifier: C,
        settings: DetectionSettings,
        region: Region,
    ) -> std::result::Result<Self, ConfigError>
    where
        C: Classifier + Send + Sync + 'static,
    {
        settings.validate()?;
        Ok(Self {
            classifier: Box::new(classifier),
            settings,
            region,
            debug_sink: None,
            visualizer: DebugVisualizer::new(),
        })
    }

    pub fn wisp(config: WispConfig, region: Region) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let settings = config.settings();
        Self::new(WispClassifier::new(config), settings, region)
    }

    pub fn rift(config: RiftConfig, region: Region) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let settings = config.settings();
        Self::new(RiftClassifier::new(config), settings, region)
    }

    pub fn with_debug_sink<S>(mut self, sink: S) -> Self
    where
        S: DebugSink + Send + Sync + 'static,
    {
        self.debug_sink = Some(Box::new(sink));
        self
    }

    pub fn with_debug_config(self, config: &DebugConfig) -> Self {
        match config.sink() {
            Some(sink) => self.with_debug_sink(sink),
            None => self,
        }
    }

    pub fn class(&self) -> ObjectClass {
        self.classifier.class()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    /// Capture the region and return the best candidate in screen space.
    ///
    /// `Ok(None)` means nothing passed the class predicate. Capture and
    /// OpenCV failures are returned as errors.
    pub fn detect(&self, source: &mut dyn FrameSource) -> Result<Option<Detection>> {
        let class = self.class();
        let frame = source
            .capture(&self.region)
            .with_context(|| format!("Failed to capture region for {} detection", class))?;

        let report = self.detect_frame(&frame)?;

        match (report.detection, report.best()) {
            (Some(detection), Some(best)) => {
                info!("{} found at ({}, {})", class, detection.screen_x, detection.screen_y);
                info!(
                    "  Area: {}, Circularity: {:.2}, Hue: {:.1}, Value: {:.1}, Sat: {:.1}",
                    best.area, best.circularity, best.hue, best.value, best.saturation
                );
            }
            _ => info!(
                "No {} detected ({} candidates rejected)",
                class,
                report.classification.rejected.len()
            ),
        }

        Ok(report.detection)
    }

    /// Run the pipeline on an already captured frame
    pub fn detect_frame(&self, frame: &Frame) -> Result<DetectionReport> {
        let start_time = Instant::now();
        let class = self.class();

        let mask = MaskBuilder::build(&frame.hsv, &self.settings)?;
        self.save_debug(DebugArtifact::Original, &frame.bgr);
        self.save_debug(DebugArtifact::Mask, &mask);

        let contours = find_external_contours(&mask)?;
        let classification = self.classify_contours(&frame.hsv, &contours)?;

        if self.debug_sink.is_some() {
            match self.visualizer.render(&frame.bgr, &classification) {
                Ok(annotated) => self.save_debug(DebugArtifact::Annotated, &annotated),
                Err(e) => warn!("Failed to render {} debug image: {:#}", class, e),
            }
        }

        let detection = classification
            .best()
            .map(|best| Detection::locate(class, best, &self.region));

        Ok(DetectionReport {
            contour_count: contours.len(),
            classification,
            detection,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Classify the contours of an existing mask against an HSV raster
    pub fn classify_mask(&self, hsv: &Mat, mask: &Mat) -> Result<Classification> {
        let contours = find_external_contours(mask)?;
        self.classify_contours(hsv, &contours)
    }

    fn classify_contours(&self, hsv: &Mat, contours: &Vector<CvContour>) -> Result<Classification> {
        let candidates = ContourAnalyzer::new(hsv).analyze_all(contours)?;
        let classification = Classification::partition(self.classifier.as_ref(), candidates);

        for candidate in &classification.rejected {
            debug!(
                "Rejected {} candidate at ({}, {}): {}",
                classification.class,
                candidate.center.x,
                candidate.center.y,
                candidate.rejection.as_deref().unwrap_or_default()
            );
        }
        debug!(
            "{}: {} contours, {} accepted",
            classification.class,
            classification.total(),
            classification.accepted.len()
        );

        Ok(classification)
    }

    // Sink failures are logged, they never change the detection result.
    fn save_debug(&self, artifact: DebugArtifact, image: &Mat) {
        if let Some(sink) = &self.debug_sink {
            if let Err(e) = sink.save(self.class(), artifact, image) {
                warn!("Failed to save {:?} debug image: {:#}", artifact, e);
            }
        }
    }
}
