//! Weighted category scorer shared by every composite.

use serde::{Deserialize, Serialize};

use visage_core::{CompositeScore, DetectionSet, Error, Result};

/// Tolerance on a table's weight sum
pub const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Static weight table: category → (member, weight)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub category: String,
    pub entries: Vec<(String, f64)>,
}

impl WeightTable {
    pub fn new<S: Into<String>>(
        category: impl Into<String>,
        entries: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self> {
        let table = Self {
            category: category.into(),
            entries: entries
                .into_iter()
                .map(|(member, weight)| (member.into(), weight))
                .collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Rejects negative or non-finite weights and sums above 1.0
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(Error::Config("weight table with empty category".into()));
        }

        let mut total = 0.0;
        for (member, weight) in &self.entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(Error::Config(format!(
                    "'{}': invalid weight {weight} for '{member}'",
                    self.category
                )));
            }
            total += weight;
        }

        if total > 1.0 + WEIGHT_SUM_EPSILON {
            return Err(Error::Config(format!(
                "'{}': weights sum to {total:.3}, above 1.0",
                self.category
            )));
        }
        Ok(())
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    /// Σ weight × confidence, absent members contributing 0
    pub fn score<F>(&self, confidence_of: F) -> CompositeScore
    where
        F: Fn(&str) -> f64,
    {
        let score: f64 = self
            .entries
            .iter()
            .map(|(member, weight)| weight * confidence_of(member.as_str()).clamp(0.0, 1.0))
            .sum();
        CompositeScore::new(self.category.clone(), score, self.entries.clone())
    }

    pub fn score_set(&self, detections: &DetectionSet) -> CompositeScore {
        self.score(|member| detections.confidence(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::Detection;

    #[test]
    fn test_rejects_overweight_table() {
        let err = WeightTable::new("heavy", [("a", 0.6), ("b", 0.5)]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_negative_weight() {
        assert!(WeightTable::new("neg", [("a", -0.1)]).is_err());
        assert!(WeightTable::new("nan", [("a", f64::NAN)]).is_err());
    }

    #[test]
    fn test_score_bounds_with_full_confidence() {
        let table =
            WeightTable::new("defensive_posture", [("a", 0.4), ("b", 0.3), ("c", 0.3)]).unwrap();
        let set = DetectionSet::from_names(["a", "b", "c"]);
        let score = table.score_set(&set);
        assert!(score.score <= 1.0);
        assert!((score.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_members_contribute_zero() {
        let table = WeightTable::new("engagement", [("lean", 0.5), ("open", 0.3)]).unwrap();
        let set = DetectionSet::from_detections([Detection::new("open", 0.5)]);
        let score = table.score_set(&set);
        assert!((score.score - 0.15).abs() < 1e-9);
        assert_eq!(score.contributing.len(), 2);
    }
}
