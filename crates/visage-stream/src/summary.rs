//! Session summary over accepted moments.

use serde::{Deserialize, Serialize};

use visage_core::AnalysisMoment;

/// Labels reported as dominant
pub const DOMINANT_LABELS: usize = 5;

/// Labels kept per timeline entry
pub const TIMELINE_LABELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: f64,
    pub labels: Vec<String>,
    pub significance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentSummary {
    pub total_analyses: usize,
    /// (label, occurrences), most frequent first; ties keep first appearance
    pub dominant_labels: Vec<(String, usize)>,
    pub timeline: Vec<TimelineEntry>,
}

impl MomentSummary {
    pub fn from_moments(moments: &[AnalysisMoment]) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for moment in moments {
            for detection in moment.detections.iter() {
                match counts.iter_mut().find(|(label, _)| *label == detection.name) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((detection.name.clone(), 1)),
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(DOMINANT_LABELS);

        let timeline = moments
            .iter()
            .map(|m| TimelineEntry {
                timestamp: m.timestamp,
                labels: m.labels().into_iter().take(TIMELINE_LABELS).collect(),
                significance: m.significance_score,
            })
            .collect();

        Self {
            total_analyses: moments.len(),
            dominant_labels: counts,
            timeline,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_analyses == 0
    }
}
