//! Deception likelihood scoring.
//!
//! Four independent sub-analyses, each scored in [0, 1]:
//!
//! | Sub-analysis | Input | Weight |
//! |---|---|---|
//! | micro_expressions | facial labels | 0.4 |
//! | body_language | reported body-language patterns | 0.3 |
//! | timing_patterns | recent expression history | 0.2 |
//! | consistency_analysis | facial vs body valence | 0.1 |
//!
//! The weighted sum gets a small bonus when many indicators fire at once,
//! then is clamped and bucketed into a [`DeceptionLevel`].
//!
//! Facial catalog names use spaces ("eye flutter left") while indicator lists
//! use underscores ("eye_flutter"); both are normalized before matching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use visage_core::{clamp_unit, Detection, Error, Result};

use crate::weighted::WeightTable;

pub const MICRO_EXPRESSIONS: &str = "micro_expressions";
pub const BODY_LANGUAGE: &str = "body_language";
pub const TIMING_PATTERNS: &str = "timing_patterns";
pub const CONSISTENCY_ANALYSIS: &str = "consistency_analysis";

/// Lowercase with underscores as spaces
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace('_', " ")
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Increments for matched micro-expression indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroWeights {
    /// Brief, forced or asymmetrical smiles
    pub smile: f64,
    /// Eye contact, flutter or blinking
    pub eye: f64,
    /// Mouth covering or compression
    pub mouth: f64,
    pub nose: f64,
    pub other: f64,
}

impl Default for MicroWeights {
    fn default() -> Self {
        Self {
            smile: 0.15,
            eye: 0.12,
            mouth: 0.18,
            nose: 0.10,
            other: 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeceptionConfig {
    /// Sub-analysis weights, keyed by sub-analysis name
    pub weights: WeightTable,
    pub micro_indicators: Vec<String>,
    pub micro_weights: MicroWeights,
    pub body_indicators: Vec<String>,
    /// Per-pattern multiplier on the pattern's confidence
    pub body_weights: BTreeMap<String, f64>,
    pub default_body_weight: f64,
    /// Fraction of consecutive history entries that must differ
    pub rapid_change_ratio: f64,
    pub rapid_change_score: f64,
    /// Strong-emotion then neutral transitions needed, exclusive
    pub suppression_min_count: usize,
    pub suppression_score: f64,
    pub suppression_strong_tokens: Vec<String>,
    pub suppression_neutral_tokens: Vec<String>,
    pub positive_face_words: Vec<String>,
    pub negative_face_words: Vec<String>,
    pub positive_body_patterns: Vec<String>,
    pub negative_body_patterns: Vec<String>,
    /// (exclusive indicator count, bonus), largest count first wins
    pub indicator_bonus: Vec<(usize, f64)>,
    pub key_indicator_min_score: f64,
    pub max_key_indicators: usize,
}

impl Default for DeceptionConfig {
    fn default() -> Self {
        let body_weights = [
            ("hand_to_face", 0.20),
            ("covering_mouth", 0.20),
            ("fidgeting", 0.15),
            ("self_soothing", 0.15),
            ("defensive_posture", 0.12),
            ("crossed_arms", 0.12),
            ("leaning_back", 0.10),
            ("closed_stance", 0.10),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            weights: WeightTable {
                category: "deception".to_string(),
                entries: vec![
                    (MICRO_EXPRESSIONS.to_string(), 0.4),
                    (BODY_LANGUAGE.to_string(), 0.3),
                    (TIMING_PATTERNS.to_string(), 0.2),
                    (CONSISTENCY_ANALYSIS.to_string(), 0.1),
                ],
            },
            micro_indicators: owned(&[
                "brief_smile",
                "forced_smile",
                "asymmetrical_smile",
                "lip_compression",
                "lip_purse",
                "mouth_cover",
                "eye_contact_avoidance",
                "rapid_blinking",
                "eye_flutter",
                "nostril_flare",
                "nose_touch",
                "jaw_tension",
                "brow_flash",
                "eyebrow_raise",
                "forehead_wrinkle",
            ]),
            micro_weights: MicroWeights::default(),
            body_indicators: owned(&[
                "hand_to_face",
                "hand_to_neck",
                "covering_mouth",
                "covering_eyes",
                "fidgeting",
                "self_soothing",
                "defensive_posture",
                "crossed_arms",
                "closed_stance",
                "leaning_back",
                "barrier_creation",
                "touching_objects",
            ]),
            body_weights,
            default_body_weight: 0.08,
            rapid_change_ratio: 0.7,
            rapid_change_score: 0.15,
            suppression_min_count: 2,
            suppression_score: 0.12,
            suppression_strong_tokens: owned(&["smile", "frown"]),
            suppression_neutral_tokens: owned(&["neutral"]),
            positive_face_words: owned(&["smile", "joy", "happy", "content", "relaxed"]),
            negative_face_words: owned(&["frown", "angry", "sad", "fear", "disgust"]),
            positive_body_patterns: owned(&["arms_open", "confident_stance", "engagement_signals"]),
            negative_body_patterns: owned(&["defensive_posture", "crossed_arms", "anxiety_indicators"]),
            indicator_bonus: vec![(5, 0.10), (3, 0.05)],
            key_indicator_min_score: 0.1,
            max_key_indicators: 5,
        }
    }
}

impl DeceptionConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        for name in [MICRO_EXPRESSIONS, BODY_LANGUAGE, TIMING_PATTERNS, CONSISTENCY_ANALYSIS] {
            if !self.weights.members().any(|m| m == name) {
                return Err(Error::Config(format!("deception weights missing '{name}'")));
            }
        }

        let m = &self.micro_weights;
        let scalars = [
            ("micro smile weight", m.smile),
            ("micro eye weight", m.eye),
            ("micro mouth weight", m.mouth),
            ("micro nose weight", m.nose),
            ("micro other weight", m.other),
            ("default body weight", self.default_body_weight),
            ("rapid change ratio", self.rapid_change_ratio),
            ("rapid change score", self.rapid_change_score),
            ("suppression score", self.suppression_score),
            ("key indicator score", self.key_indicator_min_score),
        ];
        let bodies = self.body_weights.iter().map(|(k, v)| (k.as_str(), *v));
        let bonuses = self.indicator_bonus.iter().map(|(_, b)| ("indicator bonus", *b));

        for (what, value) in scalars.into_iter().chain(bodies).chain(bonuses) {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("deception {what} {value} outside [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Half-open probability bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeceptionLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    ExtremelyHigh,
}

impl DeceptionLevel {
    pub fn from_probability(p: f64) -> Self {
        if p < 0.2 {
            DeceptionLevel::Low
        } else if p < 0.4 {
            DeceptionLevel::Moderate
        } else if p < 0.6 {
            DeceptionLevel::High
        } else if p < 0.8 {
            DeceptionLevel::VeryHigh
        } else {
            DeceptionLevel::ExtremelyHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeceptionLevel::Low => "Low",
            DeceptionLevel::Moderate => "Moderate",
            DeceptionLevel::High => "High",
            DeceptionLevel::VeryHigh => "Very High",
            DeceptionLevel::ExtremelyHigh => "Extremely High",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DeceptionLevel::Low => "Low likelihood of deception. Expressions and body language appear consistent and natural.",
            DeceptionLevel::Moderate => "Some indicators present, but could be due to nervousness or discomfort rather than deception.",
            DeceptionLevel::High => "Moderate signs of potential deception. Multiple indicators detected across facial and body language.",
            DeceptionLevel::VeryHigh => "Strong indicators of possible deception. Significant inconsistencies and stress signals detected.",
            DeceptionLevel::ExtremelyHigh => "High likelihood of deception. Multiple strong indicators across micro-expressions and body language.",
        }
    }
}

impl fmt::Display for DeceptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scored sub-analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAnalysis {
    pub category: String,
    pub score: f64,
    pub indicators: Vec<String>,
}

impl SubAnalysis {
    fn new(category: &str, score: f64, indicators: Vec<String>) -> Self {
        Self {
            category: category.to_string(),
            score: clamp_unit(score),
            indicators,
        }
    }
}

/// Sub-analysis scores fed to the final combination
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubScores {
    pub micro_expressions: f64,
    pub body_language: f64,
    pub timing_patterns: f64,
    pub consistency_analysis: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeceptionReport {
    pub probability: f64,
    pub level: DeceptionLevel,
    /// micro, body, timing, consistency
    pub breakdown: Vec<SubAnalysis>,
    pub key_indicators: Vec<String>,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeceptionScorer {
    config: DeceptionConfig,
}

impl DeceptionScorer {
    pub fn new(config: DeceptionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DeceptionConfig {
        &self.config
    }

    /// Full analysis over one moment's labels.
    ///
    /// `history` holds one label string per earlier moment, oldest first.
    pub fn analyze(
        &self,
        facial_labels: &[String],
        body_patterns: &[Detection],
        history: &[String],
    ) -> DeceptionReport {
        let breakdown = vec![
            self.micro_expressions(facial_labels),
            self.body_language(body_patterns),
            self.timing_patterns(history),
            self.consistency(facial_labels, body_patterns),
        ];

        let scores = SubScores {
            micro_expressions: breakdown[0].score,
            body_language: breakdown[1].score,
            timing_patterns: breakdown[2].score,
            consistency_analysis: breakdown[3].score,
        };
        let indicator_count = breakdown.iter().map(|s| s.indicators.len()).sum();
        let probability = self.combine(&scores, indicator_count);
        let level = DeceptionLevel::from_probability(probability);

        let key_indicators = breakdown
            .iter()
            .filter(|s| s.score > self.config.key_indicator_min_score)
            .flat_map(|s| s.indicators.iter().cloned())
            .take(self.config.max_key_indicators)
            .collect();

        tracing::debug!(probability, level = %level, indicator_count, "Scored deception");

        DeceptionReport {
            probability,
            level,
            breakdown,
            key_indicators,
            interpretation: level.description().to_string(),
        }
    }

    /// Weighted sum of sub-scores plus the indicator-count bonus, clamped
    pub fn combine(&self, scores: &SubScores, indicator_count: usize) -> f64 {
        let weighted = self
            .config
            .weights
            .score(|name| match name {
                MICRO_EXPRESSIONS => scores.micro_expressions,
                BODY_LANGUAGE => scores.body_language,
                TIMING_PATTERNS => scores.timing_patterns,
                CONSISTENCY_ANALYSIS => scores.consistency_analysis,
                _ => 0.0,
            })
            .score;

        let bonus = self
            .config
            .indicator_bonus
            .iter()
            .filter(|(count, _)| indicator_count > *count)
            .map(|(_, bonus)| *bonus)
            .fold(0.0, f64::max);

        clamp_unit(weighted + bonus)
    }

    pub fn micro_expressions(&self, facial_labels: &[String]) -> SubAnalysis {
        let indicators: Vec<String> = self
            .config
            .micro_indicators
            .iter()
            .map(|i| normalize_label(i))
            .collect();
        let w = &self.config.micro_weights;

        let mut score = 0.0;
        let mut matched = Vec::new();
        for label in facial_labels {
            let norm = normalize_label(label);
            if !indicators.iter().any(|i| norm.contains(i.as_str())) {
                continue;
            }
            matched.push(label.clone());

            let has = |word: &str| norm.contains(word);
            score += if has("smile") && (has("brief") || has("forced") || has("asymmetrical")) {
                w.smile
            } else if has("eye") && (has("contact") || has("flutter") || has("blink")) {
                w.eye
            } else if has("mouth") && (has("cover") || has("compression")) {
                w.mouth
            } else if has("nose") || has("nostril") {
                w.nose
            } else {
                w.other
            };
        }

        SubAnalysis::new(MICRO_EXPRESSIONS, score, matched)
    }

    pub fn body_language(&self, patterns: &[Detection]) -> SubAnalysis {
        let mut score = 0.0;
        let mut matched = Vec::new();

        for pattern in patterns {
            let norm = normalize_label(&pattern.name);
            if !self
                .config
                .body_indicators
                .iter()
                .any(|i| normalize_label(i) == norm)
            {
                continue;
            }
            matched.push(pattern.name.clone());

            let weight = self
                .config
                .body_weights
                .iter()
                .find(|(name, _)| normalize_label(name) == norm)
                .map(|(_, w)| *w)
                .unwrap_or(self.config.default_body_weight);
            score += pattern.confidence * weight;
        }

        SubAnalysis::new(BODY_LANGUAGE, score, matched)
    }

    pub fn timing_patterns(&self, history: &[String]) -> SubAnalysis {
        if history.len() < 3 {
            return SubAnalysis::new(TIMING_PATTERNS, 0.0, Vec::new());
        }

        let mut score = 0.0;
        let mut indicators = Vec::new();

        let changes = history.windows(2).filter(|w| w[0] != w[1]).count();
        if changes as f64 > history.len() as f64 * self.config.rapid_change_ratio {
            score += self.config.rapid_change_score;
            indicators.push("rapid_expression_changes".to_string());
        }

        let contains_any = |text: &str, tokens: &[String]| {
            let text = normalize_label(text);
            tokens.iter().any(|t| text.contains(normalize_label(t).as_str()))
        };
        let suppressed = history
            .windows(2)
            .filter(|w| {
                contains_any(&w[0], &self.config.suppression_strong_tokens)
                    && contains_any(&w[1], &self.config.suppression_neutral_tokens)
            })
            .count();
        if suppressed > self.config.suppression_min_count {
            score += self.config.suppression_score;
            indicators.push("expression_suppression".to_string());
        }

        SubAnalysis::new(TIMING_PATTERNS, score, indicators)
    }

    pub fn consistency(&self, facial_labels: &[String], body_patterns: &[Detection]) -> SubAnalysis {
        let face_has = |words: &[String]| {
            facial_labels.iter().any(|label| {
                let label = normalize_label(label);
                words.iter().any(|w| label.contains(normalize_label(w).as_str()))
            })
        };
        let body_has = |names: &[String]| {
            body_patterns.iter().any(|p| {
                let p = normalize_label(&p.name);
                names.iter().any(|n| normalize_label(n) == p)
            })
        };

        let positive_face = face_has(&self.config.positive_face_words);
        let negative_face = face_has(&self.config.negative_face_words);
        let positive_body = body_has(&self.config.positive_body_patterns);
        let negative_body = body_has(&self.config.negative_body_patterns);

        let mut score = 0.0;
        let mut indicators = Vec::new();

        if positive_face && negative_body {
            score += 0.20;
            indicators.push("positive_face_negative_body".to_string());
        } else if negative_face && positive_body {
            score += 0.15;
            indicators.push("negative_face_positive_body".to_string());
        }

        if positive_face && negative_face {
            score += 0.10;
            indicators.push("conflicting_facial_signals".to_string());
        }

        SubAnalysis::new(CONSISTENCY_ANALYSIS, score, indicators)
    }
}
