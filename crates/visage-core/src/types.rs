//! Fundamental landmark types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Session identifier for one analysis stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of subject a landmark set describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Face mesh (468 points, 478 with refined iris points)
    Face,
    /// Body pose (33 points)
    Pose,
    /// Single hand (21 points)
    Hand,
}

impl SubjectKind {
    /// Nominal number of points the provider emits for this kind
    pub fn nominal_len(&self) -> usize {
        match self {
            SubjectKind::Face => 468,
            SubjectKind::Pose => 33,
            SubjectKind::Hand => 21,
        }
    }
}

/// Normalized image-relative landmark. `z` is a provider-defined relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Positionally indexed landmark snapshot for one subject in one frame.
///
/// Immutable once built; predicates only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    kind: SubjectKind,
    subject_index: usize,
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(kind: SubjectKind, subject_index: usize, points: Vec<LandmarkPoint>) -> Self {
        Self {
            kind,
            subject_index,
            points,
        }
    }

    /// Build from `[x, y, z]` triples, the shape most providers serialize
    pub fn from_triples(kind: SubjectKind, subject_index: usize, triples: &[[f64; 3]]) -> Self {
        let points = triples
            .iter()
            .map(|t| LandmarkPoint::new(t[0], t[1], t[2]))
            .collect();
        Self::new(kind, subject_index, points)
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn subject_index(&self) -> usize {
        self.subject_index
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Checked access; absent or non-finite points are malformed geometry
    pub fn point(&self, index: usize) -> Result<&LandmarkPoint> {
        let point = self.points.get(index).ok_or(Error::MissingLandmark {
            index,
            len: self.points.len(),
        })?;

        if !point.is_finite() {
            return Err(Error::NonFiniteLandmark { index });
        }

        Ok(point)
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index).filter(|p| p.is_finite())
    }
}

/// All landmark sets the provider returned for one captured frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameLandmarks {
    /// Capture time in seconds since stream start
    pub timestamp: f64,
    pub sets: Vec<LandmarkSet>,
}

impl FrameLandmarks {
    pub fn new(timestamp: f64, sets: Vec<LandmarkSet>) -> Self {
        Self { timestamp, sets }
    }

    pub fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            sets: Vec::new(),
        }
    }

    pub fn of_kind(&self, kind: SubjectKind) -> impl Iterator<Item = &LandmarkSet> {
        self.sets.iter().filter(move |s| s.kind() == kind)
    }

    /// Lowest-indexed subject of a kind
    pub fn primary(&self, kind: SubjectKind) -> Option<&LandmarkSet> {
        self.of_kind(kind).min_by_key(|s| s.subject_index())
    }

    pub fn hands(&self) -> Vec<&LandmarkSet> {
        self.of_kind(SubjectKind::Hand).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_point_access() {
        let set = LandmarkSet::from_triples(
            SubjectKind::Hand,
            0,
            &[[0.1, 0.2, 0.0], [f64::NAN, 0.2, 0.0]],
        );

        assert!(set.point(0).is_ok());
        assert_eq!(set.point(1), Err(Error::NonFiniteLandmark { index: 1 }));
        assert_eq!(set.point(5), Err(Error::MissingLandmark { index: 5, len: 2 }));
        assert!(set.get(1).is_none());
    }

    #[test]
    fn test_primary_subject_selection() {
        let frame = FrameLandmarks::new(
            1.0,
            vec![
                LandmarkSet::new(SubjectKind::Face, 1, vec![]),
                LandmarkSet::new(SubjectKind::Hand, 0, vec![]),
                LandmarkSet::new(SubjectKind::Face, 0, vec![]),
            ],
        );

        assert_eq!(frame.primary(SubjectKind::Face).unwrap().subject_index(), 0);
        assert!(frame.primary(SubjectKind::Pose).is_none());
        assert_eq!(frame.hands().len(), 1);
    }
}
