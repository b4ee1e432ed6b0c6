//! Gesture evaluator: one catalog pass per subject of a frame.

use std::sync::Arc;

use visage_core::{DetectionSet, FrameLandmarks, LandmarkSet, SubjectDetections, SubjectKind};

use crate::catalog::PredicateCatalog;

/// Per-frame evaluation output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameEvaluation {
    pub timestamp: f64,
    /// One entry per input landmark set, in input order
    pub subjects: Vec<SubjectDetections>,
    /// Predicates skipped across all subjects
    pub skipped: usize,
}

impl FrameEvaluation {
    /// Detections of the lowest-indexed subject of a kind
    pub fn primary(&self, kind: SubjectKind) -> Option<&DetectionSet> {
        self.subjects
            .iter()
            .filter(|s| s.kind == kind)
            .min_by_key(|s| s.subject_index)
            .map(|s| &s.detections)
    }

    /// Primary face and pose max-merged with every hand accumulated.
    ///
    /// Per-hand primitives carry half credit, so two hands doing the same
    /// thing add up to a full-confidence detection.
    pub fn merged(&self) -> DetectionSet {
        let mut merged = DetectionSet::new();

        for kind in [SubjectKind::Face, SubjectKind::Pose] {
            if let Some(detections) = self.primary(kind) {
                merged.merge(detections);
            }
        }

        for hand in self.subjects.iter().filter(|s| s.kind == SubjectKind::Hand) {
            for detection in hand.detections.iter() {
                merged.accumulate(detection.clone());
            }
        }

        merged
    }

    /// Body-only view: primary pose plus accumulated hands
    pub fn body(&self) -> DetectionSet {
        let mut body = self.primary(SubjectKind::Pose).cloned().unwrap_or_default();
        for hand in self.subjects.iter().filter(|s| s.kind == SubjectKind::Hand) {
            for detection in hand.detections.iter() {
                body.accumulate(detection.clone());
            }
        }
        body
    }
}

#[derive(Debug, Clone)]
pub struct GestureEvaluator {
    catalog: Arc<PredicateCatalog>,
}

impl GestureEvaluator {
    pub fn new(catalog: Arc<PredicateCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<PredicateCatalog> {
        &self.catalog
    }

    /// One detection set per input set, same order, tagged by subject
    pub fn evaluate(&self, sets: &[LandmarkSet]) -> Vec<SubjectDetections> {
        self.evaluate_counted(sets).0
    }

    pub fn evaluate_frame(&self, frame: &FrameLandmarks) -> FrameEvaluation {
        let (subjects, skipped) = self.evaluate_counted(&frame.sets);

        tracing::debug!(
            timestamp = frame.timestamp,
            subjects = subjects.len(),
            skipped,
            "Evaluated frame"
        );

        FrameEvaluation {
            timestamp: frame.timestamp,
            subjects,
            skipped,
        }
    }

    fn evaluate_counted(&self, sets: &[LandmarkSet]) -> (Vec<SubjectDetections>, usize) {
        let mut skipped = 0;
        let subjects = sets
            .iter()
            .map(|set| {
                let report = self.catalog.evaluate_with_report(set);
                skipped += report.skipped;
                SubjectDetections {
                    kind: set.kind(),
                    subject_index: set.subject_index(),
                    detections: report.detections,
                }
            })
            .collect();
        (subjects, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::neutral_face;
    use visage_core::landmarks::{face, hand};

    fn evaluator() -> GestureEvaluator {
        GestureEvaluator::new(Arc::new(PredicateCatalog::builtin().unwrap()))
    }

    fn open_hand(index: usize) -> LandmarkSet {
        let mut points = [[0.5, 0.5, 0.0]; hand::LEN];
        points[hand::THUMB_TIP] = [0.2, 0.4, 0.0];
        points[hand::PINKY_TIP] = [0.8, 0.4, 0.0];
        LandmarkSet::from_triples(SubjectKind::Hand, index, &points)
    }

    #[test]
    fn test_one_result_per_subject_in_order() {
        let mut second_face = neutral_face();
        second_face[face::UPPER_LIP_INNER] = [0.5, 0.58, 0.0];

        let sets = vec![
            LandmarkSet::from_triples(SubjectKind::Face, 0, &neutral_face()),
            open_hand(0),
            LandmarkSet::from_triples(SubjectKind::Face, 1, &second_face),
        ];
        let results = evaluator().evaluate(&sets);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].kind, SubjectKind::Face);
        assert_eq!(results[1].kind, SubjectKind::Hand);
        assert_eq!(results[2].subject_index, 1);
        assert!(!results[0].detections.contains("mouth open"));
        assert!(results[2].detections.contains("mouth open"));
    }

    #[test]
    fn test_hands_accumulate_in_merged_view() {
        let frame = FrameLandmarks::new(0.0, vec![open_hand(0), open_hand(1)]);
        let evaluation = evaluator().evaluate_frame(&frame);

        for subject in &evaluation.subjects {
            assert_eq!(subject.detections.confidence("open_palms"), 0.5);
        }
        assert_eq!(evaluation.merged().confidence("open_palms"), 1.0);
        assert_eq!(evaluation.body().confidence("open_palms"), 1.0);
    }

    #[test]
    fn test_merged_uses_primary_face_only() {
        let mut second_face = neutral_face();
        second_face[face::UPPER_LIP_INNER] = [0.5, 0.58, 0.0];

        let frame = FrameLandmarks::new(
            1.0,
            vec![
                LandmarkSet::from_triples(SubjectKind::Face, 1, &second_face),
                LandmarkSet::from_triples(SubjectKind::Face, 0, &neutral_face()),
            ],
        );
        let evaluation = evaluator().evaluate_frame(&frame);

        assert!(!evaluation.merged().contains("mouth open"));
        assert!(evaluation.primary(SubjectKind::Pose).is_none());
    }

    #[test]
    fn test_empty_frame() {
        let evaluation = evaluator().evaluate_frame(&FrameLandmarks::empty(3.0));
        assert!(evaluation.subjects.is_empty());
        assert!(evaluation.merged().is_empty());
        assert_eq!(evaluation.skipped, 0);
    }
}
