//! Temporal significance gate.
//!
//! Bounds how often a stream asks the narrative oracle for commentary. Each
//! frame passes through, in order:
//!
//! 0. **Timestamp**: a non-finite timestamp rejects without touching state.
//! 1. **Cooldown**: `t - last_accepted < min_interval_seconds` rejects.
//! 2. **Presence**: no face or an empty detection set rejects.
//! 3. **Cold start**: the first non-empty frame is accepted (significance 1.0).
//! 4. **Geometry**: mean 3D distance over the key indices present in both the
//!    baseline and the current face must exceed `significance_threshold`.
//! 5. **Labels**: the symmetric difference against the baseline labels must
//!    reach `min_label_delta`.
//!
//! Only an accepted frame replaces the baseline. A stream returns to cold
//! start only through [`SignificanceGate::reset`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use visage_core::landmarks::face;
use visage_core::{distance_3d, AnalysisMoment, DetectionSet, Error, LandmarkSet, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub min_interval_seconds: f64,
    /// In normalized coordinate units
    pub significance_threshold: f64,
    /// Minimum label symmetric-difference size
    pub min_label_delta: usize,
    /// Face indices compared between baseline and frame
    pub key_indices: Vec<usize>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_interval_seconds: 5.0,
            significance_threshold: 0.1,
            min_label_delta: 2,
            key_indices: face::KEY_INDICES.to_vec(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_interval_seconds", self.min_interval_seconds),
            ("significance_threshold", self.significance_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("gate {name} must be finite and >= 0, got {value}")));
            }
        }
        if self.key_indices.is_empty() {
            return Err(Error::Config("gate key_indices must not be empty".into()));
        }
        if let Some(index) = self.key_indices.iter().find(|&&i| i >= face::REFINED_LEN) {
            return Err(Error::Config(format!(
                "gate key index {index} is outside the {}-point face mesh",
                face::REFINED_LEN
            )));
        }
        Ok(())
    }
}

/// The last accepted frame
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub landmarks: LandmarkSet,
    pub detections: DetectionSet,
    pub accepted_at: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GateState {
    #[default]
    ColdStart,
    Warm(Baseline),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    InvalidTimestamp,
    Cooldown { elapsed: f64 },
    NoFace,
    NoDetections,
    BelowThreshold { distance: f64 },
    LabelDelta { delta: usize },
}

impl RejectReason {
    pub fn description(&self) -> &'static str {
        match self {
            RejectReason::InvalidTimestamp => "Frame timestamp is not a finite number",
            RejectReason::Cooldown { .. } => "Within cooldown of the last accepted moment",
            RejectReason::NoFace => "No face in frame",
            RejectReason::NoDetections => "Nothing detected",
            RejectReason::BelowThreshold { .. } => "Landmarks barely moved",
            RejectReason::LabelDelta { .. } => "Too few labels changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Accepted(AnalysisMoment),
    Rejected(RejectReason),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }

    pub fn moment(self) -> Option<AnalysisMoment> {
        match self {
            GateDecision::Accepted(moment) => Some(moment),
            GateDecision::Rejected(_) => None,
        }
    }
}

/// One frame as seen by the gate
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub timestamp: f64,
    pub frame_number: u64,
    pub face: Option<&'a LandmarkSet>,
    pub detections: &'a DetectionSet,
}

/// Per-stream gate; never shared between streams
#[derive(Debug, Clone)]
pub struct SignificanceGate {
    config: GateConfig,
    state: GateState,
}

impl SignificanceGate {
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: GateState::ColdStart,
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        match &self.state {
            GateState::Warm(baseline) => Some(baseline),
            GateState::ColdStart => None,
        }
    }

    /// Mean 3D distance over key indices readable in both sets
    pub fn key_distance(&self, previous: &LandmarkSet, current: &LandmarkSet) -> f64 {
        let distances: Vec<f64> = self
            .config
            .key_indices
            .iter()
            .filter_map(|&i| Some(distance_3d(previous.get(i)?, current.get(i)?)))
            .collect();

        if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        }
    }

    pub fn observe(&mut self, input: GateInput<'_>) -> GateDecision {
        let decision = self.decide(&input);

        match &decision {
            GateDecision::Accepted(moment) => {
                if let Some(face) = input.face {
                    self.state = GateState::Warm(Baseline {
                        landmarks: face.clone(),
                        detections: input.detections.clone(),
                        accepted_at: input.timestamp,
                    });
                }
                info!(
                    timestamp = input.timestamp,
                    frame = input.frame_number,
                    labels = moment.detections.len(),
                    significance = moment.significance_score,
                    "Significant moment accepted"
                );
            }
            GateDecision::Rejected(reason) => {
                debug!(
                    timestamp = input.timestamp,
                    frame = input.frame_number,
                    ?reason,
                    "Frame rejected"
                );
            }
        }

        decision
    }

    fn decide(&self, input: &GateInput<'_>) -> GateDecision {
        if !input.timestamp.is_finite() {
            return GateDecision::Rejected(RejectReason::InvalidTimestamp);
        }

        let baseline = self.baseline();

        if let Some(baseline) = baseline {
            let elapsed = input.timestamp - baseline.accepted_at;
            if elapsed < self.config.min_interval_seconds {
                return GateDecision::Rejected(RejectReason::Cooldown { elapsed });
            }
        }

        let Some(face) = input.face else {
            return GateDecision::Rejected(RejectReason::NoFace);
        };
        if input.detections.is_empty() {
            return GateDecision::Rejected(RejectReason::NoDetections);
        }

        let Some(baseline) = baseline else {
            return self.accept(input, 1.0);
        };

        let distance = self.key_distance(&baseline.landmarks, face);
        if distance <= self.config.significance_threshold {
            return GateDecision::Rejected(RejectReason::BelowThreshold { distance });
        }

        let delta = input.detections.symmetric_difference_len(&baseline.detections);
        if delta < self.config.min_label_delta {
            return GateDecision::Rejected(RejectReason::LabelDelta { delta });
        }

        self.accept(input, distance)
    }

    fn accept(&self, input: &GateInput<'_>, significance: f64) -> GateDecision {
        GateDecision::Accepted(AnalysisMoment::new(
            input.timestamp,
            input.frame_number,
            input.detections.clone(),
            significance,
        ))
    }

    /// Back to cold start for a new video or session
    pub fn reset(&mut self) {
        self.state = GateState::ColdStart;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::SubjectKind;

    fn face_at(offset: f64) -> LandmarkSet {
        let points: Vec<[f64; 3]> = (0..468)
            .map(|i| [0.3 + (i % 20) as f64 * 0.02 + offset, 0.3 + (i / 20) as f64 * 0.015, 0.0])
            .collect();
        LandmarkSet::from_triples(SubjectKind::Face, 0, &points)
    }

    fn gate(min_interval_seconds: f64) -> SignificanceGate {
        SignificanceGate::new(GateConfig {
            min_interval_seconds,
            ..GateConfig::default()
        })
        .unwrap()
    }

    fn input<'a>(timestamp: f64, face: &'a LandmarkSet, detections: &'a DetectionSet) -> GateInput<'a> {
        GateInput {
            timestamp,
            frame_number: (timestamp * 30.0) as u64,
            face: Some(face),
            detections,
        }
    }

    #[test]
    fn test_cooldown_bounds_rate() {
        let mut gate = gate(1.0);
        let (a, b, c) = (face_at(0.0), face_at(0.3), face_at(0.0));
        let first = DetectionSet::from_names(["smile"]);
        let second = DetectionSet::from_names(["frown", "squint"]);

        assert!(gate.observe(input(0.0, &a, &first)).is_accepted());
        assert!(matches!(
            gate.observe(input(0.5, &b, &second)),
            GateDecision::Rejected(RejectReason::Cooldown { .. })
        ));
        assert!(gate.observe(input(1.1, &b, &second)).is_accepted());
        // cooldown now counts from 1.1
        assert!(!gate.observe(input(1.5, &c, &first)).is_accepted());
    }

    #[test]
    fn test_cold_start() {
        let face = face_at(0.0);
        let mut gate = gate(1.0);
        assert_eq!(
            gate.observe(input(0.0, &face, &DetectionSet::new())),
            GateDecision::Rejected(RejectReason::NoDetections)
        );
        assert_eq!(gate.state(), &GateState::ColdStart);

        let detections = DetectionSet::from_names(["smile"]);
        let moment = gate.observe(input(0.1, &face, &detections)).moment().unwrap();
        assert_eq!(moment.significance_score, 1.0);
        assert!(gate.baseline().is_some());
    }

    #[test]
    fn test_mouth_open_scenario() {
        let mut gate = gate(1.0);
        let a = face_at(0.0);
        assert!(!gate.observe(input(0.0, &a, &DetectionSet::new())).is_accepted());

        let b = face_at(0.2);
        let detections = DetectionSet::from_names(["mouth open", "eyes wide open"]);
        let moment = gate.observe(input(2.0, &b, &detections)).moment().unwrap();

        assert_eq!(moment.timestamp, 2.0);
        let mut labels = moment.labels();
        labels.sort();
        assert_eq!(labels, vec!["eyes wide open", "mouth open"]);
        assert!(moment.narrative.is_none());
    }

    #[test]
    fn test_rejected_frames_keep_baseline() {
        let mut gate = gate(0.0);
        let a = face_at(0.0);
        let smile = DetectionSet::from_names(["smile"]);
        assert!(gate.observe(input(0.0, &a, &smile)).is_accepted());
        let before = gate.baseline().cloned();

        // moved, but one changed label is not enough
        let b = face_at(0.3);
        let one_change = DetectionSet::from_names(["smile", "squint"]);
        assert_eq!(
            gate.observe(input(1.0, &b, &one_change)),
            GateDecision::Rejected(RejectReason::LabelDelta { delta: 1 })
        );
        assert_eq!(gate.baseline().cloned(), before);

        // still compared against frame a, not b
        let c = face_at(0.05);
        let changed = DetectionSet::from_names(["frown", "squint"]);
        assert!(matches!(
            gate.observe(input(2.0, &c, &changed)),
            GateDecision::Rejected(RejectReason::BelowThreshold { .. })
        ));
        assert_eq!(gate.baseline().cloned(), before);
    }

    #[test]
    fn test_face_loss_keeps_history() {
        let mut gate = gate(0.0);
        let a = face_at(0.0);
        let smile = DetectionSet::from_names(["smile"]);
        gate.observe(input(0.0, &a, &smile));

        let lost = gate.observe(GateInput {
            timestamp: 3.0,
            frame_number: 90,
            face: None,
            detections: &DetectionSet::new(),
        });
        assert_eq!(lost, GateDecision::Rejected(RejectReason::NoFace));
        assert!(matches!(gate.state(), GateState::Warm(_)));

        gate.reset();
        assert_eq!(gate.state(), &GateState::ColdStart);
    }

    #[test]
    fn test_threshold_is_strict() {
        let gate = gate(0.0);
        let a = face_at(0.0);
        let b = face_at(0.1);
        let distance = gate.key_distance(&a, &b);
        assert!((distance - 0.1).abs() < 1e-9);
        assert!(gate.key_distance(&a, &a) == 0.0);
    }

    #[test]
    fn test_distance_equal_to_threshold_is_rejected() {
        let measure = gate(0.0);
        let (a, b) = (face_at(0.0), face_at(0.1));
        let distance = measure.key_distance(&a, &b);
        let smile = DetectionSet::from_names(["smile"]);
        let changed = DetectionSet::from_names(["frown", "squint"]);

        let mut at_threshold = SignificanceGate::new(GateConfig {
            min_interval_seconds: 0.0,
            significance_threshold: distance,
            ..GateConfig::default()
        })
        .unwrap();
        assert!(at_threshold.observe(input(0.0, &a, &smile)).is_accepted());
        assert_eq!(
            at_threshold.observe(input(1.0, &b, &changed)),
            GateDecision::Rejected(RejectReason::BelowThreshold { distance })
        );

        let mut below_threshold = SignificanceGate::new(GateConfig {
            min_interval_seconds: 0.0,
            significance_threshold: distance - 1e-9,
            ..GateConfig::default()
        })
        .unwrap();
        assert!(below_threshold.observe(input(0.0, &a, &smile)).is_accepted());
        let moment = below_threshold.observe(input(1.0, &b, &changed)).moment().unwrap();
        assert_eq!(moment.significance_score, distance);
    }

    #[test]
    fn test_non_finite_timestamp_keeps_cooldown() {
        let mut gate = gate(5.0);
        let (a, b) = (face_at(0.0), face_at(0.3));
        let smile = DetectionSet::from_names(["smile"]);
        let changed = DetectionSet::from_names(["frown", "squint"]);
        assert!(gate.observe(input(0.0, &a, &smile)).is_accepted());

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                gate.observe(input(bad, &b, &changed)),
                GateDecision::Rejected(RejectReason::InvalidTimestamp)
            );
        }
        assert_eq!(gate.baseline().unwrap().accepted_at, 0.0);

        assert!(matches!(
            gate.observe(input(0.1, &b, &changed)),
            GateDecision::Rejected(RejectReason::Cooldown { .. })
        ));
        assert!(gate.observe(input(5.0, &b, &changed)).is_accepted());
    }

    #[test]
    fn test_non_finite_timestamp_on_cold_start() {
        let mut gate = gate(1.0);
        let face = face_at(0.0);
        let smile = DetectionSet::from_names(["smile"]);
        assert_eq!(
            gate.observe(input(f64::NAN, &face, &smile)),
            GateDecision::Rejected(RejectReason::InvalidTimestamp)
        );
        assert_eq!(gate.state(), &GateState::ColdStart);
    }

    #[test]
    fn test_invalid_config() {
        assert!(SignificanceGate::new(GateConfig {
            significance_threshold: -0.1,
            ..GateConfig::default()
        })
        .is_err());
        assert!(SignificanceGate::new(GateConfig {
            key_indices: vec![],
            ..GateConfig::default()
        })
        .is_err());
        assert!(SignificanceGate::new(GateConfig {
            key_indices: vec![face::NOSE_BRIDGE, 9999],
            ..GateConfig::default()
        })
        .is_err());
        assert!(SignificanceGate::new(GateConfig {
            key_indices: vec![face::REFINED_LEN],
            ..GateConfig::default()
        })
        .is_err());
        assert!(SignificanceGate::new(GateConfig {
            key_indices: vec![face::REFINED_LEN - 1],
            ..GateConfig::default()
        })
        .is_ok());
    }

    #[test]
    fn test_streams_are_isolated() {
        let mut first = gate(0.0);
        let second = gate(0.0);
        let face = face_at(0.0);
        first.observe(input(0.0, &face, &DetectionSet::from_names(["smile"])));
        assert!(first.baseline().is_some());
        assert!(second.baseline().is_none());
    }
}
