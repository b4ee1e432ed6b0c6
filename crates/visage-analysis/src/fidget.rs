//! Wrist-motion fidget tracking.
//!
//! Fidgeting is small but sustained hand movement, so it cannot be read from
//! a single frame. The tracker keeps the previous pose's wrist positions and a
//! short window of summed wrist displacement per frame.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use visage_core::landmarks::pose;
use visage_core::{distance_2d, mean, Detection, LandmarkPoint, LandmarkSet};

pub const FIDGETING: &str = "fidgeting";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FidgetConfig {
    /// Movement samples retained
    pub window: usize,
    /// Trailing samples averaged for the decision
    pub sample: usize,
    /// Exclusive bounds on mean per-frame movement
    pub min_movement: f64,
    pub max_movement: f64,
    pub confidence: f64,
}

impl Default for FidgetConfig {
    fn default() -> Self {
        Self {
            window: 10,
            sample: 5,
            min_movement: 0.02,
            max_movement: 0.1,
            confidence: 0.6,
        }
    }
}

/// Per-stream fidget state
#[derive(Debug, Clone, Default)]
pub struct FidgetTracker {
    config: FidgetConfig,
    previous: Option<(LandmarkPoint, LandmarkPoint)>,
    movements: VecDeque<f64>,
}

impl FidgetTracker {
    pub fn new(config: FidgetConfig) -> Self {
        Self {
            config,
            previous: None,
            movements: VecDeque::new(),
        }
    }

    /// Feed the frame's primary pose and return the fidgeting confidence.
    ///
    /// Frames without a readable pose leave the state untouched.
    pub fn observe(&mut self, pose_set: Option<&LandmarkSet>) -> f64 {
        let Some(set) = pose_set else {
            return 0.0;
        };
        let (Ok(left), Ok(right)) = (set.point(pose::LEFT_WRIST), set.point(pose::RIGHT_WRIST))
        else {
            return 0.0;
        };
        let current = (*left, *right);

        let Some(previous) = self.previous.replace(current) else {
            return 0.0;
        };

        let movement = distance_2d(&current.0, &previous.0) + distance_2d(&current.1, &previous.1);
        self.movements.push_back(movement);
        while self.movements.len() > self.config.window {
            self.movements.pop_front();
        }

        self.score()
    }

    /// Confidence from the current window without observing a new frame
    pub fn score(&self) -> f64 {
        let sample = self.config.sample.max(1);
        if self.movements.len() < sample {
            return 0.0;
        }

        let recent: Vec<f64> = self.movements.iter().rev().take(sample).copied().collect();
        let average = mean(&recent);
        if average > self.config.min_movement && average < self.config.max_movement {
            self.config.confidence
        } else {
            0.0
        }
    }

    pub fn detection(&self) -> Option<Detection> {
        let score = self.score();
        (score > 0.0).then(|| Detection::new(FIDGETING, score))
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.movements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::SubjectKind;

    fn pose_with_wrists(left_x: f64, right_x: f64) -> LandmarkSet {
        let mut points = vec![[0.5, 0.5, 0.0]; pose::LEN];
        points[pose::LEFT_WRIST] = [left_x, 0.7, 0.0];
        points[pose::RIGHT_WRIST] = [right_x, 0.7, 0.0];
        LandmarkSet::from_triples(SubjectKind::Pose, 0, &points)
    }

    #[test]
    fn test_small_sustained_motion_is_fidgeting() {
        let mut tracker = FidgetTracker::default();
        let mut last = 0.0;
        // each wrist moves 0.02 per frame: 0.04 summed
        for i in 0..7 {
            let offset = if i % 2 == 0 { 0.0 } else { 0.02 };
            last = tracker.observe(Some(&pose_with_wrists(0.3 + offset, 0.7 + offset)));
        }
        assert_eq!(last, 0.6);
        assert_eq!(tracker.detection().map(|d| d.name), Some(FIDGETING.to_string()));
    }

    #[test]
    fn test_still_subject_is_not_fidgeting() {
        let mut tracker = FidgetTracker::default();
        for _ in 0..8 {
            assert_eq!(tracker.observe(Some(&pose_with_wrists(0.3, 0.7))), 0.0);
        }
        assert!(tracker.detection().is_none());
    }

    #[test]
    fn test_large_motion_is_not_fidgeting() {
        let mut tracker = FidgetTracker::default();
        let mut last = 1.0;
        for i in 0..8 {
            let offset = if i % 2 == 0 { 0.0 } else { 0.2 };
            last = tracker.observe(Some(&pose_with_wrists(0.3 + offset, 0.6 + offset)));
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_needs_full_sample() {
        let mut tracker = FidgetTracker::default();
        for i in 0..5 {
            let offset = if i % 2 == 0 { 0.0 } else { 0.02 };
            assert_eq!(tracker.observe(Some(&pose_with_wrists(0.3 + offset, 0.7 + offset))), 0.0);
        }
        // the sixth frame completes five movement samples
        assert_eq!(tracker.observe(Some(&pose_with_wrists(0.3, 0.7))), 0.6);
    }

    #[test]
    fn test_missing_pose_keeps_state() {
        let mut tracker = FidgetTracker::default();
        tracker.observe(Some(&pose_with_wrists(0.3, 0.7)));
        assert_eq!(tracker.observe(None), 0.0);
        tracker.observe(Some(&pose_with_wrists(0.32, 0.72)));
        assert_eq!(tracker.movements.len(), 1);
    }
}
