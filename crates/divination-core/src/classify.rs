//! Class predicates and ranking
//!
//! Both detectors share one pipeline; what differs is the [`Classifier`]
//! that accepts or rejects each analyzed contour and ranks the survivors.

use crate::candidate::{Candidate, ObjectClass};
use crate::config::{RiftConfig, WispConfig};
use serde::Serialize;

/// Class-specific accept rule and ranking key
pub trait Classifier {
    fn class(&self) -> ObjectClass;

    /// Every predicate of the class must hold
    fn accepts(&self, candidate: &Candidate) -> bool;

    /// Short diagnostic snapshot attached to rejected candidates
    fn rejection_reason(&self, candidate: &Candidate) -> String;

    /// Larger is better
    fn rank_key(&self, candidate: &Candidate) -> f64 {
        candidate.area
    }
}

/// Small, roughly round blobs
#[derive(Debug, Clone, Default)]
pub struct WispClassifier {
    config: WispConfig,
}

impl WispClassifier {
    pub fn new(config: WispConfig) -> Self {
        Self { config }
    }
}

impl Classifier for WispClassifier {
    fn class(&self) -> ObjectClass {
        ObjectClass::Wisp
    }

    fn accepts(&self, candidate: &Candidate) -> bool {
        let c = &self.config;
        c.min_area < candidate.area
            && candidate.area < c.max_area
            && candidate.circularity > c.min_circularity
            && c.min_aspect_ratio < candidate.aspect_ratio
            && candidate.aspect_ratio < c.max_aspect_ratio
    }

    fn rejection_reason(&self, candidate: &Candidate) -> String {
        format!("A:{} C:{:.2}", candidate.area as i64, candidate.circularity)
    }
}

/// Large, bright, saturated blobs of any shape
#[derive(Debug, Clone, Default)]
pub struct RiftClassifier {
    config: RiftConfig,
}

impl RiftClassifier {
    pub fn new(config: RiftConfig) -> Self {
        Self { config }
    }
}

impl Classifier for RiftClassifier {
    fn class(&self) -> ObjectClass {
        ObjectClass::Rift
    }

    // Rifts are concave and ragged, circularity is deliberately ignored.
    fn accepts(&self, candidate: &Candidate) -> bool {
        let c = &self.config;
        candidate.area > c.min_area
            && candidate.value > c.min_value
            && candidate.saturation > c.min_saturation
    }

    fn rejection_reason(&self, candidate: &Candidate) -> String {
        format!("A:{} V:{}", candidate.area as i64, candidate.value as i64)
    }
}

/// Accepted/rejected partition of one frame's candidates
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub class: ObjectClass,
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<Candidate>,
    best: Option<usize>,
}

impl Classification {
    /// Place every candidate in exactly one of the two sets and pick the
    /// best accepted one.
    ///
    /// Ties on the rank key go to the earliest candidate, so identical input
    /// always yields the same winner.
    pub fn partition<C>(classifier: &C, candidates: Vec<Candidate>) -> Self
    where
        C: Classifier + ?Sized,
    {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            if classifier.accepts(&candidate) {
                accepted.push(candidate);
            } else {
                let reason = classifier.rejection_reason(&candidate);
                rejected.push(candidate.rejected(reason));
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in accepted.iter().enumerate() {
            let key = classifier.rank_key(candidate);
            match best {
                Some((_, best_key)) if key <= best_key => {}
                _ => best = Some((index, key)),
            }
        }

        Self {
            class: classifier.class(),
            accepted,
            rejected,
            best: best.map(|(index, _)| index),
        }
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.map(|index| &self.accepted[index])
    }

    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}
