//! Detections, composite scores and analysis moments.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::SubjectKind;

/// Clamp into [0, 1]; NaN collapses to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One named, confidence-scored predicate result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence: clamp_unit(confidence),
        }
    }
}

/// Name-unique collection of detections, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_detections(detections: impl IntoIterator<Item = Detection>) -> Self {
        let mut set = Self::new();
        for detection in detections {
            set.insert(detection);
        }
        set
    }

    /// Boolean detections at full confidence
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_detections(names.into_iter().map(|n| Detection::new(n, 1.0)))
    }

    /// Insert, keeping the higher-confidence instance on a name collision
    pub fn insert(&mut self, detection: Detection) {
        match self.detections.iter_mut().find(|d| d.name == detection.name) {
            Some(existing) => {
                if detection.confidence > existing.confidence {
                    existing.confidence = detection.confidence;
                }
            }
            None => self.detections.push(detection),
        }
    }

    /// Insert, summing confidences on a name collision (clamped)
    pub fn accumulate(&mut self, detection: Detection) {
        match self.detections.iter_mut().find(|d| d.name == detection.name) {
            Some(existing) => {
                existing.confidence = clamp_unit(existing.confidence + detection.confidence);
            }
            None => self.detections.push(detection),
        }
    }

    /// Max-merge another set into this one
    pub fn merge(&mut self, other: &DetectionSet) {
        for detection in other.iter() {
            self.insert(detection.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detections.iter().any(|d| d.name == name)
    }

    /// Confidence of a detection, 0.0 when absent
    pub fn confidence(&self, name: &str) -> f64 {
        self.detections
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.confidence)
            .unwrap_or(0.0)
    }

    pub fn names(&self) -> Vec<&str> {
        self.detections.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn name_set(&self) -> HashSet<&str> {
        self.detections.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of names present in exactly one of the two sets
    pub fn symmetric_difference_len(&self, other: &DetectionSet) -> usize {
        self.name_set()
            .symmetric_difference(&other.name_set())
            .count()
    }

    /// Detections strictly above a confidence, sorted descending
    pub fn above(&self, threshold: f64) -> Vec<Detection> {
        let mut result: Vec<Detection> = self
            .detections
            .iter()
            .filter(|d| d.confidence > threshold)
            .cloned()
            .collect();
        sort_by_confidence(&mut result);
        result
    }

    /// Comma separated names, the form handed to the narrative oracle
    pub fn label_text(&self) -> String {
        self.names().join(", ")
    }
}

impl IntoIterator for DetectionSet {
    type Item = Detection;
    type IntoIter = std::vec::IntoIter<Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.into_iter()
    }
}

/// Sort descending by confidence; ties keep their relative order
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

/// Detections for one subject of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDetections {
    pub kind: SubjectKind,
    pub subject_index: usize,
    pub detections: DetectionSet,
}

/// Weighted aggregate of member confidences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub category: String,
    pub score: f64,
    /// (member name, weight) in table order
    pub contributing: Vec<(String, f64)>,
}

impl CompositeScore {
    pub fn new(category: impl Into<String>, score: f64, contributing: Vec<(String, f64)>) -> Self {
        Self {
            category: category.into(),
            score: clamp_unit(score),
            contributing,
        }
    }

    pub fn to_detection(&self) -> Detection {
        Detection::new(self.category.clone(), self.score)
    }
}

/// A frame the significance gate approved for deeper analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMoment {
    /// Seconds since stream start
    pub timestamp: f64,
    pub frame_number: u64,
    pub detections: DetectionSet,
    pub significance_score: f64,
    /// Filled in later by the narrative oracle
    pub narrative: Option<String>,
}

impl AnalysisMoment {
    pub fn new(
        timestamp: f64,
        frame_number: u64,
        detections: DetectionSet,
        significance_score: f64,
    ) -> Self {
        Self {
            timestamp,
            frame_number,
            detections,
            significance_score,
            narrative: None,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.detections.iter().map(|d| d.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_confidence_is_clamped() {
        assert_eq!(Detection::new("a", 1.7).confidence, 1.0);
        assert_eq!(Detection::new("a", -0.2).confidence, 0.0);
        assert_eq!(Detection::new("a", f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_insert_keeps_highest_confidence() {
        let mut set = DetectionSet::new();
        set.insert(Detection::new("pointing", 0.5));
        set.insert(Detection::new("pointing", 0.3));
        assert_eq!(set.len(), 1);
        assert_eq!(set.confidence("pointing"), 0.5);

        set.insert(Detection::new("pointing", 0.9));
        assert_eq!(set.confidence("pointing"), 0.9);
    }

    #[test]
    fn test_accumulate_sums_and_clamps() {
        let mut set = DetectionSet::new();
        set.accumulate(Detection::new("open_palms", 0.5));
        set.accumulate(Detection::new("open_palms", 0.5));
        set.accumulate(Detection::new("open_palms", 0.5));
        assert_eq!(set.confidence("open_palms"), 1.0);
    }

    #[test]
    fn test_symmetric_difference() {
        let a = DetectionSet::from_names(["mouth open", "frown"]);
        let b = DetectionSet::from_names(["frown", "eyes wide open", "smirk left"]);
        assert_eq!(a.symmetric_difference_len(&b), 3);
        assert_eq!(a.symmetric_difference_len(&a), 0);
    }

    #[test]
    fn test_above_sorts_descending() {
        let set = DetectionSet::from_detections([
            Detection::new("a", 0.5),
            Detection::new("b", 0.9),
            Detection::new("c", 0.4),
        ]);
        let above = set.above(0.4);
        assert_eq!(above.len(), 2);
        assert_eq!(above[0].name, "b");
    }
}
