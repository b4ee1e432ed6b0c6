//! Declarative rule model.
//!
//! A rule is data: measures over positional landmark indices, strict
//! comparisons against named thresholds and weighted clauses. Because rules
//! are plain values they can be validated up front, serialized, and have
//! their thresholds replaced without touching evaluation code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use visage_core::{
    angle_at, clamp_unit, distance_2d, Error, LandmarkPoint, LandmarkSet, Result, SubjectKind,
};

/// Tolerance on the sum of clause weights
const WEIGHT_EPSILON: f64 = 1e-9;

/// Coordinate axis of a landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of(&self, point: &LandmarkPoint) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
            Axis::Z => point.z,
        }
    }
}

/// A 2D location derived from landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointRef {
    /// A landmark as-is
    Landmark { index: usize },
    /// Centroid of anchor landmarks shifted by a fixed offset
    Offset {
        anchors: Vec<usize>,
        dx: f64,
        dy: f64,
    },
}

impl PointRef {
    fn resolve(&self, landmarks: &LandmarkSet) -> Result<LandmarkPoint> {
        match self {
            PointRef::Landmark { index } => landmarks.point(*index).copied(),
            PointRef::Offset { anchors, dx, dy } => {
                if anchors.is_empty() {
                    return Err(Error::InvalidInput("offset point without anchors".into()));
                }
                let mut x = 0.0;
                let mut y = 0.0;
                for index in anchors {
                    let p = landmarks.point(*index)?;
                    x += p.x;
                    y += p.y;
                }
                let n = anchors.len() as f64;
                Ok(LandmarkPoint::new(x / n + dx, y / n + dy, 0.0))
            }
        }
    }

    fn indices(&self, out: &mut BTreeSet<usize>) {
        match self {
            PointRef::Landmark { index } => {
                out.insert(*index);
            }
            PointRef::Offset { anchors, .. } => out.extend(anchors.iter().copied()),
        }
    }
}

/// Scalar measurement over one landmark set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Measure {
    Coord { index: usize, axis: Axis },
    /// `a - b`
    Diff { a: Box<Measure>, b: Box<Measure> },
    Abs { of: Box<Measure> },
    Mean { of: Vec<Measure> },
    /// `num / den`; a vanishing denominator makes every comparison false
    Ratio { num: Box<Measure>, den: Box<Measure> },
    /// Planar distance between two points
    Distance { a: PointRef, b: PointRef },
    /// Mean planar distance from several landmarks to one target
    MeanDistance { from: Vec<usize>, to: usize },
    /// Interior angle at `vertex` in degrees
    Angle { a: usize, vertex: usize, c: usize },
}

impl Measure {
    pub fn value(&self, landmarks: &LandmarkSet) -> Result<f64> {
        match self {
            Measure::Coord { index, axis } => Ok(axis.of(landmarks.point(*index)?)),
            Measure::Diff { a, b } => Ok(a.value(landmarks)? - b.value(landmarks)?),
            Measure::Abs { of } => Ok(of.value(landmarks)?.abs()),
            Measure::Mean { of } => {
                if of.is_empty() {
                    return Err(Error::InvalidInput("mean of no measures".into()));
                }
                let mut sum = 0.0;
                for m in of {
                    sum += m.value(landmarks)?;
                }
                Ok(sum / of.len() as f64)
            }
            Measure::Ratio { num, den } => {
                let den = den.value(landmarks)?;
                let num = num.value(landmarks)?;
                if den.abs() < f64::EPSILON {
                    Ok(f64::NAN)
                } else {
                    Ok(num / den)
                }
            }
            Measure::Distance { a, b } => {
                Ok(distance_2d(&a.resolve(landmarks)?, &b.resolve(landmarks)?))
            }
            Measure::MeanDistance { from, to } => {
                if from.is_empty() {
                    return Err(Error::InvalidInput("mean distance from no landmarks".into()));
                }
                let target = landmarks.point(*to)?;
                let mut sum = 0.0;
                for index in from {
                    sum += distance_2d(landmarks.point(*index)?, target);
                }
                Ok(sum / from.len() as f64)
            }
            Measure::Angle { a, vertex, c } => Ok(angle_at(
                landmarks.point(*a)?,
                landmarks.point(*vertex)?,
                landmarks.point(*c)?,
            )),
        }
    }

    /// Whether the measure can never be negative
    pub fn is_magnitude(&self) -> bool {
        matches!(
            self,
            Measure::Abs { .. }
                | Measure::Distance { .. }
                | Measure::MeanDistance { .. }
                | Measure::Angle { .. }
        )
    }

    fn indices(&self, out: &mut BTreeSet<usize>) {
        match self {
            Measure::Coord { index, .. } => {
                out.insert(*index);
            }
            Measure::Diff { a, b } | Measure::Ratio { num: a, den: b } => {
                a.indices(out);
                b.indices(out);
            }
            Measure::Abs { of } => of.indices(out),
            Measure::Mean { of } => of.iter().for_each(|m| m.indices(out)),
            Measure::Distance { a, b } => {
                a.indices(out);
                b.indices(out);
            }
            Measure::MeanDistance { from, to } => {
                out.extend(from.iter().copied());
                out.insert(*to);
            }
            Measure::Angle { a, vertex, c } => {
                out.extend([*a, *vertex, *c]);
            }
        }
    }
}

/// Boolean test over measures. All comparisons are strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    Greater { measure: Measure, threshold: f64 },
    Less { measure: Measure, threshold: f64 },
    /// `low < measure < high`
    Between { measure: Measure, low: f64, high: f64 },
    All { of: Vec<Condition> },
    Any { of: Vec<Condition> },
}

impl Condition {
    /// Evaluate; the first unreadable landmark aborts the whole condition
    pub fn holds(&self, landmarks: &LandmarkSet) -> Result<bool> {
        match self {
            Condition::Greater { measure, threshold } => {
                Ok(measure.value(landmarks)? > *threshold)
            }
            Condition::Less { measure, threshold } => Ok(measure.value(landmarks)? < *threshold),
            Condition::Between { measure, low, high } => {
                let v = measure.value(landmarks)?;
                Ok(v > *low && v < *high)
            }
            Condition::All { of } => {
                for c in of {
                    if !c.holds(landmarks)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any { of } => {
                for c in of {
                    if c.holds(landmarks)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn thresholds(&self, out: &mut Vec<f64>) {
        match self {
            Condition::Greater { threshold, .. } | Condition::Less { threshold, .. } => {
                out.push(*threshold)
            }
            Condition::Between { low, high, .. } => {
                out.push(*low);
                out.push(*high);
            }
            Condition::All { of } | Condition::Any { of } => {
                of.iter().for_each(|c| c.thresholds(out))
            }
        }
    }

    fn replace_thresholds(&mut self, values: &mut impl Iterator<Item = f64>) -> Result<()> {
        match self {
            Condition::Greater { threshold, .. } | Condition::Less { threshold, .. } => {
                *threshold = next_threshold(values)?;
            }
            Condition::Between { low, high, .. } => {
                *low = next_threshold(values)?;
                *high = next_threshold(values)?;
            }
            Condition::All { of } | Condition::Any { of } => {
                for c in of {
                    c.replace_thresholds(values)?;
                }
            }
        }
        Ok(())
    }

    fn validate(&self, rule: &str) -> Result<()> {
        let check = |measure: &Measure, value: f64| -> Result<()> {
            if !value.is_finite() {
                return Err(Error::Config(format!("rule '{rule}': non-finite threshold")));
            }
            if measure.is_magnitude() && value < 0.0 {
                return Err(Error::Config(format!(
                    "rule '{rule}': negative threshold {value} on a magnitude"
                )));
            }
            Ok(())
        };
        match self {
            Condition::Greater { measure, threshold } | Condition::Less { measure, threshold } => {
                check(measure, *threshold)
            }
            Condition::Between { measure, low, high } => {
                check(measure, *low)?;
                check(measure, *high)?;
                if low > high {
                    return Err(Error::Config(format!(
                        "rule '{rule}': empty interval ({low}, {high})"
                    )));
                }
                Ok(())
            }
            Condition::All { of } | Condition::Any { of } => {
                if of.is_empty() {
                    return Err(Error::Config(format!("rule '{rule}': empty condition group")));
                }
                of.iter().try_for_each(|c| c.validate(rule))
            }
        }
    }

    fn indices(&self, out: &mut BTreeSet<usize>) {
        match self {
            Condition::Greater { measure, .. }
            | Condition::Less { measure, .. }
            | Condition::Between { measure, .. } => measure.indices(out),
            Condition::All { of } | Condition::Any { of } => {
                of.iter().for_each(|c| c.indices(out))
            }
        }
    }
}

fn next_threshold(values: &mut impl Iterator<Item = f64>) -> Result<f64> {
    values
        .next()
        .ok_or_else(|| Error::Config("too few threshold values".into()))
}

/// Partial credit awarded when a condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub when: Condition,
    pub weight: f64,
}

/// A named geometric predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub subject: SubjectKind,
    pub clauses: Vec<Clause>,
}

impl RuleSpec {
    /// Single clause at full weight
    pub fn boolean(name: impl Into<String>, subject: SubjectKind, when: Condition) -> Self {
        Self {
            name: name.into(),
            subject,
            clauses: vec![Clause { when, weight: 1.0 }],
        }
    }

    pub fn graded(
        name: impl Into<String>,
        subject: SubjectKind,
        clauses: impl IntoIterator<Item = (Condition, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            subject,
            clauses: clauses
                .into_iter()
                .map(|(when, weight)| Clause { when, weight })
                .collect(),
        }
    }

    /// Confidence in [0, 1]; 0 means not matched
    pub fn confidence(&self, landmarks: &LandmarkSet) -> Result<f64> {
        let mut total = 0.0;
        for clause in &self.clauses {
            if clause.when.holds(landmarks)? {
                total += clause.weight;
            }
        }
        Ok(clamp_unit(total))
    }

    /// Thresholds in clause order, depth first
    pub fn thresholds(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for clause in &self.clauses {
            clause.when.thresholds(&mut out);
        }
        out
    }

    /// Copy with thresholds replaced in the order [`RuleSpec::thresholds`] reports them
    pub fn with_thresholds(&self, values: &[f64]) -> Result<Self> {
        let expected = self.thresholds().len();
        if values.len() != expected {
            return Err(Error::Config(format!(
                "rule '{}' takes {expected} thresholds, got {}",
                self.name,
                values.len()
            )));
        }

        let mut rule = self.clone();
        let mut iter = values.iter().copied();
        for clause in &mut rule.clauses {
            clause.when.replace_thresholds(&mut iter)?;
        }
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("rule with empty name".into()));
        }
        if self.clauses.is_empty() {
            return Err(Error::Config(format!("rule '{}' has no clauses", self.name)));
        }

        let mut total = 0.0;
        for clause in &self.clauses {
            if !clause.weight.is_finite() || clause.weight < 0.0 {
                return Err(Error::Config(format!(
                    "rule '{}': invalid clause weight {}",
                    self.name, clause.weight
                )));
            }
            total += clause.weight;
            clause.when.validate(&self.name)?;
        }
        if total > 1.0 + WEIGHT_EPSILON {
            return Err(Error::Config(format!(
                "rule '{}': clause weights sum to {total}",
                self.name
            )));
        }
        Ok(())
    }

    /// Every landmark index the rule may read
    pub fn required_indices(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for clause in &self.clauses {
            clause.when.indices(&mut out);
        }
        out
    }
}

// Builders used by the rule tables

pub fn x(index: usize) -> Measure {
    Measure::Coord {
        index,
        axis: Axis::X,
    }
}

pub fn y(index: usize) -> Measure {
    Measure::Coord {
        index,
        axis: Axis::Y,
    }
}

pub fn z(index: usize) -> Measure {
    Measure::Coord {
        index,
        axis: Axis::Z,
    }
}

pub fn diff(a: Measure, b: Measure) -> Measure {
    Measure::Diff {
        a: Box::new(a),
        b: Box::new(b),
    }
}

pub fn abs(of: Measure) -> Measure {
    Measure::Abs { of: Box::new(of) }
}

pub fn abs_diff(a: Measure, b: Measure) -> Measure {
    abs(diff(a, b))
}

pub fn mean(of: impl IntoIterator<Item = Measure>) -> Measure {
    Measure::Mean {
        of: of.into_iter().collect(),
    }
}

pub fn ratio(num: Measure, den: Measure) -> Measure {
    Measure::Ratio {
        num: Box::new(num),
        den: Box::new(den),
    }
}

pub fn landmark(index: usize) -> PointRef {
    PointRef::Landmark { index }
}

pub fn offset(anchors: impl IntoIterator<Item = usize>, dx: f64, dy: f64) -> PointRef {
    PointRef::Offset {
        anchors: anchors.into_iter().collect(),
        dx,
        dy,
    }
}

pub fn distance(a: PointRef, b: PointRef) -> Measure {
    Measure::Distance { a, b }
}

pub fn dist(a: usize, b: usize) -> Measure {
    distance(landmark(a), landmark(b))
}

pub fn mean_distance(from: impl IntoIterator<Item = usize>, to: usize) -> Measure {
    Measure::MeanDistance {
        from: from.into_iter().collect(),
        to,
    }
}

pub fn angle(a: usize, vertex: usize, c: usize) -> Measure {
    Measure::Angle { a, vertex, c }
}

pub fn gt(measure: Measure, threshold: f64) -> Condition {
    Condition::Greater { measure, threshold }
}

pub fn lt(measure: Measure, threshold: f64) -> Condition {
    Condition::Less { measure, threshold }
}

pub fn between(measure: Measure, low: f64, high: f64) -> Condition {
    Condition::Between { measure, low, high }
}

pub fn all(of: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::All {
        of: of.into_iter().collect(),
    }
}

pub fn any(of: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Any {
        of: of.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[[f64; 3]]) -> LandmarkSet {
        LandmarkSet::from_triples(SubjectKind::Hand, 0, points)
    }

    #[test]
    fn test_comparisons_are_strict() {
        let lm = set(&[[0.75, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        let width = abs_diff(x(0), x(1));

        assert!(!gt(width.clone(), 0.25).holds(&lm).unwrap());
        assert!(!lt(width.clone(), 0.25).holds(&lm).unwrap());
        assert!(gt(width.clone(), 0.125).holds(&lm).unwrap());
        assert!(!between(width, 0.25, 0.5).holds(&lm).unwrap());
    }

    #[test]
    fn test_missing_landmark_aborts() {
        let lm = set(&[[0.0, 0.0, 0.0]]);
        let cond = any([gt(y(0), -1.0), gt(y(9), 0.0)]);

        // short circuit never reads index 9
        assert!(cond.holds(&lm).unwrap());

        let cond = any([gt(y(9), 0.0), gt(y(0), -1.0)]);
        assert!(matches!(
            cond.holds(&lm),
            Err(Error::MissingLandmark { index: 9, .. })
        ));
    }

    #[test]
    fn test_graded_confidence_sums_weights() {
        let lm = set(&[[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        let rule = RuleSpec::graded(
            "spread",
            SubjectKind::Hand,
            [
                (gt(dist(0, 1), 0.25), 0.5),
                (lt(y(1), 0.5), 0.25),
                (gt(y(1), 0.5), 0.25),
            ],
        );
        assert_eq!(rule.confidence(&lm).unwrap(), 0.75);
    }

    #[test]
    fn test_ratio_with_zero_denominator_never_holds() {
        let lm = set(&[[0.5, 0.0, 0.0], [0.5, 0.0, 0.0], [0.1, 0.0, 0.0]]);
        let r = ratio(abs_diff(x(2), x(0)), abs_diff(x(0), x(1)));

        assert!(!gt(r.clone(), 1.0).holds(&lm).unwrap());
        assert!(!lt(r, 1.0).holds(&lm).unwrap());
    }

    #[test]
    fn test_offset_point_distance() {
        let lm = set(&[[0.0, 0.5, 0.0], [1.0, 0.5, 0.0], [0.5, 0.25, 0.0]]);
        let neck = offset([0, 1], 0.0, -0.25);
        let d = distance(landmark(2), neck).value(&lm).unwrap();
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn test_threshold_replacement_order() {
        let rule = RuleSpec::boolean(
            "combo",
            SubjectKind::Hand,
            all([gt(y(0), 0.1), between(abs(x(1)), 0.2, 0.3)]),
        );
        assert_eq!(rule.thresholds(), vec![0.1, 0.2, 0.3]);

        let replaced = rule.with_thresholds(&[0.5, 0.0, 0.4]).unwrap();
        assert_eq!(replaced.thresholds(), vec![0.5, 0.0, 0.4]);

        assert!(matches!(rule.with_thresholds(&[0.5]), Err(Error::Config(_))));
        assert!(matches!(
            rule.with_thresholds(&[0.5, -0.1, 0.4]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validation() {
        let overweight = RuleSpec::graded(
            "heavy",
            SubjectKind::Pose,
            [(gt(y(0), 0.0), 0.75), (gt(y(1), 0.0), 0.5)],
        );
        assert!(overweight.validate().is_err());

        let nan = RuleSpec::boolean("nan", SubjectKind::Pose, gt(y(0), f64::NAN));
        assert!(nan.validate().is_err());

        let signed = RuleSpec::boolean("signed", SubjectKind::Pose, lt(diff(y(0), y(1)), -0.1));
        assert!(signed.validate().is_ok());
    }

    #[test]
    fn test_required_indices() {
        let rule = RuleSpec::boolean(
            "r",
            SubjectKind::Pose,
            all([
                gt(angle(11, 13, 15), 70.0),
                lt(distance(landmark(0), offset([11, 12], 0.0, 0.1)), 0.2),
            ]),
        );
        let indices: Vec<usize> = rule.required_indices().into_iter().collect();
        assert_eq!(indices, vec![0, 11, 12, 13, 15]);
    }

    #[test]
    fn test_rule_serde_shape() {
        let rule = RuleSpec::boolean(
            "mouth open",
            SubjectKind::Face,
            gt(abs_diff(y(13), y(14)), 0.05),
        );
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["subject"], "face");
        assert_eq!(json["clauses"][0]["when"]["when"], "greater");
        assert_eq!(json["clauses"][0]["when"]["measure"]["op"], "abs");
    }
}
