//! # Visage-Gestures
//!
//! Fixed rule bank of geometric predicates over landmark snapshots.
//!
//! ## Rule model
//!
//! Every predicate is a [`RuleSpec`]: a name, the subject kind it applies to
//! and a list of weighted clauses. Each clause holds a [`Condition`] built
//! from [`Measure`]s over positional landmark indices. The confidence of a
//! rule is the sum of the weights of its satisfied clauses, clamped to [0, 1]:
//!
//! - a boolean rule has one clause of weight 1.0
//! - a graded rule (body language) has several partial-credit clauses
//!
//! Thresholds are hand-tuned constants, exposed per rule in
//! [`face_rules::thresholds`] and [`body_rules::thresholds`], and may be
//! overridden by name without touching evaluation code.
//!
//! ## Flow
//!
//! ```text
//! FrameLandmarks
//!     ↓
//! [GestureEvaluator] ── one DetectionSet per LandmarkSet, same order
//!     ↓
//! [PredicateCatalog::evaluate_all] ── malformed geometry → skipped, not fatal
//! ```

pub mod body_rules;
pub mod catalog;
pub mod evaluator;
pub mod face_rules;
pub mod rule;

pub use catalog::*;
pub use evaluator::*;
pub use rule::*;
