//! Geometric predicate catalog.
//!
//! The catalog is an ordered, name-unique list of predicates. It holds no
//! mutable state after construction, so one instance is shared read-only
//! (behind `Arc`) across every concurrently running stream.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use visage_core::{clamp_unit, Detection, DetectionSet, Error, LandmarkSet, Result, SubjectKind};

use crate::body_rules::{hand_rules, pose_rules};
use crate::face_rules::face_rules;
use crate::rule::RuleSpec;

/// A named geometric rule over one landmark set.
///
/// `evaluate` returns a confidence in [0, 1] where 0 means not matched. An
/// `Err` for unreadable landmarks is expected and counted as skipped by the
/// catalog rather than aborting the pass.
pub trait GesturePredicate: Send + Sync {
    fn name(&self) -> &str;

    fn subject(&self) -> SubjectKind;

    fn evaluate(&self, landmarks: &LandmarkSet) -> Result<f64>;
}

impl GesturePredicate for RuleSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn subject(&self) -> SubjectKind {
        self.subject
    }

    fn evaluate(&self, landmarks: &LandmarkSet) -> Result<f64> {
        self.confidence(landmarks)
    }
}

/// Predicate backed by a plain function
pub struct FnPredicate<F> {
    name: String,
    subject: SubjectKind,
    func: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&LandmarkSet) -> Result<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, subject: SubjectKind, func: F) -> Self {
        Self {
            name: name.into(),
            subject,
            func,
        }
    }
}

impl<F> GesturePredicate for FnPredicate<F>
where
    F: Fn(&LandmarkSet) -> Result<f64> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn subject(&self) -> SubjectKind {
        self.subject
    }

    fn evaluate(&self, landmarks: &LandmarkSet) -> Result<f64> {
        (self.func)(landmarks)
    }
}

/// Catalog tuning, usually loaded as part of the engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Replacement thresholds by rule name, in the rule's reading order
    pub threshold_overrides: BTreeMap<String, Vec<f64>>,
    /// Additional declarative rules appended after the built-in bank
    pub extra_rules: Vec<RuleSpec>,
}

impl CatalogConfig {
    /// Check overrides and extra rules without building a catalog
    pub fn validate(&self) -> Result<()> {
        PredicateCatalog::from_config(self).map(|_| ())
    }
}

/// Outcome of one catalog pass over one landmark set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogEvaluation {
    pub detections: DetectionSet,
    /// Predicates of the matching subject kind that ran
    pub evaluated: usize,
    /// Predicates that could not read their landmarks
    pub skipped: usize,
}

/// Every built-in rule: face, then pose, then hand
pub fn builtin_rules() -> Vec<RuleSpec> {
    let mut rules = face_rules();
    rules.extend(pose_rules());
    rules.extend(hand_rules());
    rules
}

#[derive(Default)]
pub struct PredicateCatalog {
    predicates: Vec<Arc<dyn GesturePredicate>>,
    names: HashSet<String>,
}

impl PredicateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule bank with default thresholds
    pub fn builtin() -> Result<Self> {
        Self::from_rules(builtin_rules())
    }

    /// The built-in rule bank after applying overrides and extra rules
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut rules = builtin_rules();

        for (name, values) in &config.threshold_overrides {
            let slot = rules
                .iter_mut()
                .find(|r| &r.name == name)
                .ok_or_else(|| Error::Config(format!("threshold override for unknown rule '{name}'")))?;
            *slot = slot.with_thresholds(values)?;
        }

        rules.extend(config.extra_rules.iter().cloned());
        Self::from_rules(rules)
    }

    pub fn from_rules(rules: impl IntoIterator<Item = RuleSpec>) -> Result<Self> {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.register_rule(rule)?;
        }
        Ok(catalog)
    }

    /// Append a predicate; names must be unique
    pub fn register(&mut self, predicate: Arc<dyn GesturePredicate>) -> Result<()> {
        let name = predicate.name();
        if name.trim().is_empty() {
            return Err(Error::Config("predicate with empty name".into()));
        }
        if !self.names.insert(name.to_string()) {
            return Err(Error::DuplicatePredicate(name.to_string()));
        }
        self.predicates.push(predicate);
        Ok(())
    }

    pub fn register_rule(&mut self, rule: RuleSpec) -> Result<()> {
        rule.validate()?;
        self.register(Arc::new(rule))
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, subject: SubjectKind, func: F) -> Result<()>
    where
        F: Fn(&LandmarkSet) -> Result<f64> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnPredicate::new(name, subject, func)))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    /// Apply every predicate of the set's subject kind
    pub fn evaluate_all(&self, landmarks: &LandmarkSet) -> DetectionSet {
        self.evaluate_with_report(landmarks).detections
    }

    pub fn evaluate_with_report(&self, landmarks: &LandmarkSet) -> CatalogEvaluation {
        let mut report = CatalogEvaluation::default();
        let kind = landmarks.kind();

        for predicate in self.predicates.iter().filter(|p| p.subject() == kind) {
            report.evaluated += 1;
            match predicate.evaluate(landmarks) {
                Ok(confidence) => {
                    let confidence = clamp_unit(confidence);
                    if confidence > 0.0 {
                        report
                            .detections
                            .insert(Detection::new(predicate.name(), confidence));
                    }
                }
                Err(e) if e.is_malformed_landmarks() => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(predicate = predicate.name(), error = %e, "Predicate failed");
                    report.skipped += 1;
                }
            }
        }

        if report.skipped > 0 {
            tracing::debug!(
                subject = ?kind,
                subject_index = landmarks.subject_index(),
                skipped = report.skipped,
                evaluated = report.evaluated,
                "Skipped predicates on unreadable landmarks"
            );
        }

        report
    }
}

impl fmt::Debug for PredicateCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateCatalog")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::face_rules::thresholds;
    use crate::rule::{abs_diff, gt, x};
    use visage_core::landmarks::face;

    /// A plain 468-point mesh where no expression rule of interest fires
    pub(crate) fn neutral_face() -> Vec<[f64; 3]> {
        let mut points = vec![[0.5, 0.5, 0.0]; face::REFINED_LEN - 10];
        let mut set = |i: usize, x: f64, y: f64| points[i] = [x, y, 0.0];

        set(face::FOREHEAD_TOP, 0.5, 0.2);
        set(face::FOREHEAD_MID, 0.5, 0.3);
        set(face::LEFT_BROW, 0.42, 0.35);
        set(face::RIGHT_BROW, 0.58, 0.35);
        set(face::LEFT_EYE_TOP, 0.42, 0.38);
        set(face::LEFT_EYE_BOTTOM, 0.42, 0.4);
        set(face::RIGHT_EYE_TOP, 0.58, 0.38);
        set(face::RIGHT_EYE_BOTTOM, 0.58, 0.4);
        set(face::UPPER_LIP_INNER, 0.5, 0.64);
        set(face::LOWER_LIP_INNER, 0.5, 0.66);
        set(face::MOUTH_LEFT, 0.47, 0.65);
        set(face::MOUTH_RIGHT, 0.53, 0.65);
        set(face::CHIN, 0.5, 0.8);
        points
    }

    fn face_set(points: &[[f64; 3]]) -> LandmarkSet {
        LandmarkSet::from_triples(SubjectKind::Face, 0, points)
    }

    #[test]
    fn test_builtin_catalog_builds() {
        let catalog = PredicateCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), builtin_rules().len());
        assert!(catalog.contains("raised eyebrow"));
        assert!(catalog.contains("crossed_arms"));
        assert!(catalog.contains("pointing"));
    }

    #[test]
    fn test_eyebrow_raise_scenario() {
        let mut points = neutral_face();
        // eyebrow 0.07 above the eyelid
        points[face::LEFT_BROW] = [0.42, 0.31, 0.0];

        let catalog = PredicateCatalog::builtin().unwrap();
        let detections = catalog.evaluate_all(&face_set(&points));

        assert_eq!(detections.confidence("raised eyebrow"), 1.0);
        assert_eq!(detections.confidence("raised left eyebrow"), 1.0);
        assert!(!detections.contains("raised right eyebrow"));
    }

    #[test]
    fn test_neutral_face_does_not_raise_eyebrows() {
        let catalog = PredicateCatalog::builtin().unwrap();
        let detections = catalog.evaluate_all(&face_set(&neutral_face()));
        assert!(!detections.contains("raised eyebrow"));
        assert!(!detections.contains("mouth open"));
    }

    #[test]
    fn test_iris_rules_skipped_on_plain_mesh() {
        let catalog = PredicateCatalog::builtin().unwrap();
        let report = catalog.evaluate_with_report(&face_set(&neutral_face()));

        assert_eq!(report.skipped, 6);
        assert_eq!(report.evaluated, crate::face_rules::face_rules().len());
        assert!(!report.detections.contains("eye contact direct"));
    }

    #[test]
    fn test_empty_set_yields_empty_detections() {
        let catalog = PredicateCatalog::builtin().unwrap();
        let report = catalog.evaluate_with_report(&LandmarkSet::new(SubjectKind::Pose, 0, vec![]));
        assert!(report.detections.is_empty());
        assert_eq!(report.skipped, report.evaluated);
    }

    #[test]
    fn test_only_matching_subject_kind_runs() {
        let catalog = PredicateCatalog::builtin().unwrap();
        let hand = LandmarkSet::from_triples(SubjectKind::Hand, 0, &[[0.5, 0.5, 0.0]; 21]);
        let report = catalog.evaluate_with_report(&hand);

        assert_eq!(report.evaluated, crate::body_rules::hand_rules().len());
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut catalog = PredicateCatalog::builtin().unwrap();
        let err = catalog
            .register_fn("mouth open", SubjectKind::Face, |_| Ok(1.0))
            .unwrap_err();
        assert_eq!(err, Error::DuplicatePredicate("mouth open".into()));
    }

    #[test]
    fn test_failing_predicate_does_not_abort_pass() {
        let mut catalog = PredicateCatalog::new();
        catalog
            .register_fn("broken", SubjectKind::Hand, |_| Err(Error::InvalidInput("boom".into())))
            .unwrap();
        catalog
            .register_fn("always", SubjectKind::Hand, |_| Ok(0.5))
            .unwrap();

        let report = catalog.evaluate_with_report(&LandmarkSet::new(SubjectKind::Hand, 0, vec![]));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.detections.confidence("always"), 0.5);
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let rule = RuleSpec::boolean(
            "wide grip",
            SubjectKind::Hand,
            gt(abs_diff(x(0), x(1)), 0.25),
        );
        let catalog = PredicateCatalog::from_rules([rule]).unwrap();

        let at = LandmarkSet::from_triples(SubjectKind::Hand, 0, &[[0.75, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        assert!(catalog.evaluate_all(&at).is_empty());

        let past = LandmarkSet::from_triples(SubjectKind::Hand, 0, &[[0.875, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        assert_eq!(past.len(), 2);
        assert_eq!(catalog.evaluate_all(&past).confidence("wide grip"), 1.0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let catalog = PredicateCatalog::builtin().unwrap();
        let mut points = neutral_face();
        points[face::UPPER_LIP_INNER] = [0.5, 0.6, 0.0];
        let set = face_set(&points);

        let first = catalog.evaluate_all(&set);
        for _ in 0..5 {
            assert_eq!(catalog.evaluate_all(&set), first);
        }
    }

    #[test]
    fn test_threshold_override() {
        let mut points = neutral_face();
        points[face::LEFT_BROW] = [0.42, 0.33, 0.0];
        let set = face_set(&points);

        let default = PredicateCatalog::builtin().unwrap();
        assert!(!default.evaluate_all(&set).contains("raised left eyebrow"));

        let mut config = CatalogConfig::default();
        config
            .threshold_overrides
            .insert("raised left eyebrow".into(), vec![0.04]);
        let tuned = PredicateCatalog::from_config(&config).unwrap();
        assert!(tuned.evaluate_all(&set).contains("raised left eyebrow"));
        assert_eq!(thresholds::RAISED_LEFT_EYEBROW, 0.06);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CatalogConfig::default();
        config.threshold_overrides.insert("no such rule".into(), vec![0.1]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = CatalogConfig::default();
        config.threshold_overrides.insert("mouth open".into(), vec![0.1, 0.2]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = CatalogConfig::default();
        config.threshold_overrides.insert("mouth open".into(), vec![-0.1]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_catalog_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredicateCatalog>();
    }
}
