//! Stress level estimation.
//!
//! ## Regions
//!
//! | Region | Landmarks | Weight |
//! |---|---|---|
//! | forehead | brow and forehead mesh points | 0.35 |
//! | lip | lip corners, inner lips, jaw | 0.25 |
//! | fidget | hands, shoulders, neck, plus history | 0.25 |
//! | eye | eyelids | 0.15 |
//!
//! Each region score is the mean of its triggered indicator scores (0 when
//! none trigger). The weighted region sum becomes an integer percentage,
//! truncated and capped at 100, and is bucketed into a [`StressLevel`].
//!
//! Indicator thresholds live in [`thresholds`] and can be replaced per
//! indicator through [`StressConfig::threshold_overrides`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use visage_core::landmarks::{face, hand, pose};
use visage_core::{mean, std_dev, Error, LandmarkSet, Result, SubjectKind};
use visage_gestures::{abs_diff, diff, dist, gt, lt, mean as mean_of, x, y, Condition, RuleSpec};

use crate::weighted::WeightTable;

pub const FOREHEAD: &str = "forehead";
pub const LIP: &str = "lip";
pub const FIDGET: &str = "fidget";
pub const EYE: &str = "eye";

/// Readings kept for trend analysis
pub const DEFAULT_HISTORY_LEN: usize = 30;

/// Points of change between trend windows
pub const TREND_DELTA: f64 = 10.0;

/// Maximum recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Indicator thresholds in normalized image units
pub mod thresholds {
    pub const HORIZONTAL_FOREHEAD_LINES: f64 = 0.02;
    pub const FROWN_LINES: f64 = 0.045;
    /// Brow minus eyelid height; negative is brow above lid
    pub const RAISED_EYEBROWS: f64 = -0.035;
    pub const LOWERED_EYEBROWS: f64 = -0.015;
    pub const FOREHEAD_COMPRESSION: f64 = 0.12;
    pub const LIP_COMPRESSION: f64 = 0.008;
    pub const LIP_PURSING: f64 = 0.045;
    pub const MOUTH_ASYMMETRY: f64 = 0.015;
    pub const JAW_TENSION: f64 = 0.08;
    pub const SQUINTING: f64 = 0.012;
    pub const EYE_ASYMMETRY: f64 = 0.008;
    pub const EYELID_TENSION: f64 = -0.08;
    pub const SHOULDER_TENSION: f64 = 0.03;
    pub const NECK_STRAIN: f64 = 0.15;
    pub const FINGER_TENSION: f64 = 0.05;
    /// Std-dev of the last five fidget scores
    pub const RESTLESS_MOVEMENT: f64 = 0.2;
}

const RESTLESS_MOVEMENT_SCORE: f64 = 0.8;

/// A named geometric stress cue and the score it contributes
#[derive(Debug, Clone)]
struct Indicator {
    rule: RuleSpec,
    score: f64,
}

impl Indicator {
    fn new(name: &str, subject: SubjectKind, when: Condition, score: f64) -> Self {
        Self {
            rule: RuleSpec::boolean(name, subject, when),
            score,
        }
    }

    /// Unreadable landmarks count as not triggered
    fn triggered(&self, set: &LandmarkSet) -> bool {
        matches!(self.rule.confidence(set), Ok(c) if c > 0.0)
    }
}

fn face_indicators(region: &str) -> Vec<Indicator> {
    use face::*;
    use thresholds::*;
    let f = SubjectKind::Face;
    match region {
        FOREHEAD => {
            let brow_height = mean_of([y(LEFT_INNER_BROW), y(RIGHT_INNER_BROW)]);
            let eye_height = mean_of([y(LEFT_EYE_TOP), y(RIGHT_EYE_TOP)]);
            vec![
                Indicator::new(
                    "horizontal_forehead_lines",
                    f,
                    lt(abs_diff(y(FOREHEAD_TOP), y(FOREHEAD_MID)), HORIZONTAL_FOREHEAD_LINES),
                    0.8,
                ),
                Indicator::new(
                    "frown_lines",
                    f,
                    lt(dist(LEFT_INNER_BROW, RIGHT_INNER_BROW), FROWN_LINES),
                    0.9,
                ),
                Indicator::new(
                    "raised_eyebrows",
                    f,
                    lt(diff(brow_height.clone(), eye_height.clone()), RAISED_EYEBROWS),
                    0.7,
                ),
                Indicator::new(
                    "lowered_eyebrows",
                    f,
                    gt(diff(brow_height, eye_height), LOWERED_EYEBROWS),
                    0.6,
                ),
                Indicator::new(
                    "forehead_compression",
                    f,
                    lt(abs_diff(x(LEFT_FOREHEAD), x(RIGHT_FOREHEAD)), FOREHEAD_COMPRESSION),
                    0.5,
                ),
            ]
        }
        LIP => vec![
            Indicator::new(
                "lip_compression",
                f,
                lt(abs_diff(y(UPPER_LIP_INNER), y(LOWER_LIP_INNER)), LIP_COMPRESSION),
                0.8,
            ),
            Indicator::new(
                "lip_pursing",
                f,
                lt(abs_diff(x(MOUTH_LEFT), x(MOUTH_RIGHT)), LIP_PURSING),
                0.7,
            ),
            Indicator::new(
                "mouth_asymmetry",
                f,
                gt(
                    abs_diff(
                        abs_diff(x(MOUTH_LEFT), x(UPPER_LIP_INNER)),
                        abs_diff(x(MOUTH_RIGHT), x(UPPER_LIP_INNER)),
                    ),
                    MOUTH_ASYMMETRY,
                ),
                0.6,
            ),
            Indicator::new(
                "jaw_tension",
                f,
                lt(abs_diff(x(LEFT_JAW), x(RIGHT_JAW)), JAW_TENSION),
                0.5,
            ),
        ],
        EYE => {
            let left = abs_diff(y(LEFT_EYE_TOP), y(LEFT_EYE_BOTTOM));
            let right = abs_diff(y(RIGHT_EYE_TOP), y(RIGHT_EYE_BOTTOM));
            vec![
                Indicator::new(
                    "squinting",
                    f,
                    lt(mean_of([left.clone(), right.clone()]), SQUINTING),
                    0.8,
                ),
                Indicator::new("eye_asymmetry", f, gt(abs_diff(left, right), EYE_ASYMMETRY), 0.6),
                Indicator::new(
                    "eyelid_tension",
                    f,
                    lt(
                        diff(
                            mean_of([y(LEFT_EYE_OUTER), y(RIGHT_EYE_INNER)]),
                            y(FOREHEAD_TOP),
                        ),
                        EYELID_TENSION,
                    ),
                    0.5,
                ),
            ]
        }
        _ => Vec::new(),
    }
}

fn pose_indicators() -> Vec<Indicator> {
    vec![
        Indicator::new(
            "shoulder_tension",
            SubjectKind::Pose,
            gt(abs_diff(y(pose::LEFT_SHOULDER), y(pose::RIGHT_SHOULDER)), thresholds::SHOULDER_TENSION),
            0.6,
        ),
        Indicator::new(
            "neck_strain",
            SubjectKind::Pose,
            gt(abs_diff(y(pose::NOSE), y(pose::LEFT_EYE_INNER)), thresholds::NECK_STRAIN),
            0.5,
        ),
    ]
}

fn hand_indicator() -> Indicator {
    Indicator::new(
        "finger_tension",
        SubjectKind::Hand,
        lt(dist(hand::THUMB_TIP, hand::INDEX_TIP), thresholds::FINGER_TENSION),
        0.7,
    )
}

/// A region's score with the cues behind it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionScore {
    pub score: f64,
    pub indicators: Vec<String>,
}

impl RegionScore {
    fn from_hits(hits: Vec<(String, f64)>) -> Self {
        let scores: Vec<f64> = hits.iter().map(|(_, s)| *s).collect();
        Self {
            score: if scores.is_empty() { 0.0 } else { mean(&scores) },
            indicators: hits.into_iter().map(|(name, _)| name).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl StressLevel {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => StressLevel::VeryHigh,
            60..=79 => StressLevel::High,
            40..=59 => StressLevel::Moderate,
            20..=39 => StressLevel::Low,
            _ => StressLevel::VeryLow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "Very Low",
            StressLevel::Low => "Low",
            StressLevel::Moderate => "Moderate",
            StressLevel::High => "High",
            StressLevel::VeryHigh => "Very High",
        }
    }

    /// Display color for dashboards
    pub fn color(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "#44CC44",
            StressLevel::Low => "#88CC00",
            StressLevel::Moderate => "#FFCC00",
            StressLevel::High => "#FF8800",
            StressLevel::VeryHigh => "#FF4444",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressReport {
    pub percentage: u32,
    pub level: StressLevel,
    pub forehead: RegionScore,
    pub lip: RegionScore,
    pub fidget: RegionScore,
    pub eye: RegionScore,
    pub recommendations: Vec<String>,
}

impl StressReport {
    /// Every triggered cue, region by region
    pub fn indicators(&self) -> Vec<&str> {
        [&self.forehead, &self.lip, &self.fidget, &self.eye]
            .into_iter()
            .flat_map(|r| r.indicators.iter().map(String::as_str))
            .collect()
    }
}

/// Subset of a reading kept for trend and restlessness analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressReading {
    pub percentage: u32,
    pub fidget_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    InsufficientData,
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressTrend {
    pub direction: TrendDirection,
    pub recent_average: f64,
    pub change: f64,
}

/// Bounded per-stream stress history
#[derive(Debug, Clone)]
pub struct StressHistory {
    readings: VecDeque<StressReading>,
    capacity: usize,
}

impl Default for StressHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl StressHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, report: &StressReport) {
        self.readings.push_back(StressReading {
            percentage: report.percentage,
            fidget_score: report.fidget.score,
        });
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> impl Iterator<Item = &StressReading> {
        self.readings.iter()
    }

    fn last(&self, n: usize) -> Vec<StressReading> {
        let skip = self.readings.len().saturating_sub(n);
        self.readings.iter().skip(skip).copied().collect()
    }

    /// Population std-dev of the last five fidget scores exceeds
    /// [`thresholds::RESTLESS_MOVEMENT`]
    pub fn is_restless(&self) -> bool {
        if self.readings.len() <= 5 {
            return false;
        }
        let recent: Vec<f64> = self.last(5).iter().map(|r| r.fidget_score).collect();
        std_dev(&recent) > thresholds::RESTLESS_MOVEMENT
    }

    /// Last five readings against the five before them
    pub fn trend(&self) -> StressTrend {
        let len = self.readings.len();
        if len < 2 {
            return StressTrend {
                direction: TrendDirection::InsufficientData,
                recent_average: 0.0,
                change: 0.0,
            };
        }

        let average = |readings: &[StressReading]| {
            mean(&readings.iter().map(|r| r.percentage as f64).collect::<Vec<_>>())
        };
        let recent = self.last(5);
        let recent_average = average(recent.as_slice());
        let older_average = if len >= 10 {
            let older: Vec<StressReading> = self.readings.iter().skip(len - 10).take(5).copied().collect();
            average(older.as_slice())
        } else {
            recent_average
        };

        let change = recent_average - older_average;
        let direction = if change > TREND_DELTA {
            TrendDirection::Increasing
        } else if change < -TREND_DELTA {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };

        StressTrend {
            direction,
            recent_average,
            change,
        }
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub weights: WeightTable,
    pub history_len: usize,
    /// Replacement thresholds by indicator name, in the indicator's reading order
    pub threshold_overrides: BTreeMap<String, Vec<f64>>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable {
                category: "stress".to_string(),
                entries: vec![
                    (FOREHEAD.to_string(), 0.35),
                    (LIP.to_string(), 0.25),
                    (FIDGET.to_string(), 0.25),
                    (EYE.to_string(), 0.15),
                ],
            },
            history_len: DEFAULT_HISTORY_LEN,
            threshold_overrides: BTreeMap::new(),
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.history_len == 0 {
            return Err(Error::Config("stress history_len must be positive".into()));
        }
        StressScorer::build(self.weights.clone()).apply_overrides(&self.threshold_overrides)?;
        Ok(())
    }
}

/// Inputs for one stress reading
#[derive(Debug, Clone, Copy, Default)]
pub struct StressInput<'a> {
    pub face: Option<&'a LandmarkSet>,
    pub pose: Option<&'a LandmarkSet>,
    pub hands: &'a [&'a LandmarkSet],
}

#[derive(Debug, Clone)]
pub struct StressScorer {
    weights: WeightTable,
    forehead: Vec<Indicator>,
    lip: Vec<Indicator>,
    eye: Vec<Indicator>,
    posture: Vec<Indicator>,
    fingers: Indicator,
}

impl Default for StressScorer {
    fn default() -> Self {
        Self::build(StressConfig::default().weights)
    }
}

impl StressScorer {
    pub fn new(config: &StressConfig) -> Result<Self> {
        config.validate()?;
        let mut scorer = Self::build(config.weights.clone());
        scorer.apply_overrides(&config.threshold_overrides)?;
        Ok(scorer)
    }

    fn build(weights: WeightTable) -> Self {
        Self {
            weights,
            forehead: face_indicators(FOREHEAD),
            lip: face_indicators(LIP),
            eye: face_indicators(EYE),
            posture: pose_indicators(),
            fingers: hand_indicator(),
        }
    }

    fn indicators_mut(&mut self) -> impl Iterator<Item = &mut Indicator> {
        self.forehead
            .iter_mut()
            .chain(self.lip.iter_mut())
            .chain(self.eye.iter_mut())
            .chain(self.posture.iter_mut())
            .chain(std::iter::once(&mut self.fingers))
    }

    fn apply_overrides(&mut self, overrides: &BTreeMap<String, Vec<f64>>) -> Result<()> {
        for (name, values) in overrides {
            let indicator = self
                .indicators_mut()
                .find(|i| &i.rule.name == name)
                .ok_or_else(|| Error::Config(format!("threshold override for unknown stress indicator '{name}'")))?;
            indicator.rule = indicator.rule.with_thresholds(values)?;
        }
        Ok(())
    }

    /// Current thresholds of one indicator
    pub fn thresholds(&self, indicator: &str) -> Option<Vec<f64>> {
        [&self.forehead, &self.lip, &self.eye, &self.posture]
            .into_iter()
            .flatten()
            .chain(std::iter::once(&self.fingers))
            .find(|i| i.rule.name == indicator)
            .map(|i| i.rule.thresholds())
    }

    fn face_region(indicators: &[Indicator], face: Option<&LandmarkSet>) -> RegionScore {
        let Some(face) = face else {
            return RegionScore::default();
        };
        RegionScore::from_hits(
            indicators
                .iter()
                .filter(|i| i.triggered(face))
                .map(|i| (i.rule.name.clone(), i.score))
                .collect(),
        )
    }

    fn fidget_region(&self, input: &StressInput<'_>, history: &StressHistory) -> RegionScore {
        let mut hits = Vec::new();

        for hand in input.hands {
            if self.fingers.triggered(hand) {
                hits.push((self.fingers.rule.name.clone(), self.fingers.score));
            }
        }
        if let Some(pose) = input.pose {
            for indicator in self.posture.iter().filter(|i| i.triggered(pose)) {
                hits.push((indicator.rule.name.clone(), indicator.score));
            }
        }
        if history.is_restless() {
            hits.push(("restless_movement".to_string(), RESTLESS_MOVEMENT_SCORE));
        }

        RegionScore::from_hits(hits)
    }

    /// Score one frame against the stream's history; the caller records it
    pub fn score(&self, input: &StressInput<'_>, history: &StressHistory) -> StressReport {
        let forehead = Self::face_region(&self.forehead, input.face);
        let lip = Self::face_region(&self.lip, input.face);
        let eye = Self::face_region(&self.eye, input.face);
        let fidget = self.fidget_region(input, history);

        let weighted = self
            .weights
            .score(|region| match region {
                FOREHEAD => forehead.score,
                LIP => lip.score,
                FIDGET => fidget.score,
                EYE => eye.score,
                _ => 0.0,
            })
            .score;
        let percentage = percentage_of(weighted);
        let level = StressLevel::from_percentage(percentage);

        let mut report = StressReport {
            percentage,
            level,
            forehead,
            lip,
            fidget,
            eye,
            recommendations: Vec::new(),
        };
        report.recommendations = recommendations(percentage, &report.indicators());
        report
    }
}

/// Truncating percentage of a [0, 1] score, capped at 100
pub fn percentage_of(score: f64) -> u32 {
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    ((score * 100.0) as u32).min(100)
}

/// Up to four suggestions driven by level and triggered cues
pub fn recommendations(percentage: u32, indicators: &[&str]) -> Vec<String> {
    let has = |names: &[&str]| names.iter().any(|n| indicators.contains(n));
    let mut out: Vec<&str> = Vec::new();

    if percentage >= 70 {
        out.push("Take deep breaths - try 4-7-8 breathing technique");
        out.push("Consider a 5-minute break from current activity");
    }
    if has(&["frown_lines", "forehead_compression"]) {
        out.push("Consciously relax your forehead muscles");
        out.push("Try gentle forehead massage");
    }
    if has(&["lip_compression", "jaw_tension"]) {
        out.push("Relax your jaw and lips");
        out.push("Do gentle jaw stretches");
    }
    if has(&["finger_tension", "restless_movement"]) {
        out.push("Try progressive muscle relaxation");
        out.push("Take a short walk if possible");
    }
    if has(&["squinting", "eyelid_tension"]) {
        out.push("Rest your eyes - look at something distant");
        out.push("Adjust lighting or screen brightness");
    }
    if percentage >= 50 {
        out.push("Consider stress management techniques");
        out.push("Stay hydrated and maintain good posture");
    }

    out.into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}
