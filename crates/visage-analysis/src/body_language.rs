//! Body-language interpretation.
//!
//! Pose/hand primitives come from the gesture catalog (plus fidgeting from
//! [`crate::FidgetTracker`]). Higher-level categories are weighted sums over
//! those primitives and over categories earlier in the table, so table order
//! matters: `submissive_posture` reads `defensive_posture` and `self_soothing`.

use serde::{Deserialize, Serialize};

use visage_core::{sort_by_confidence, Detection, DetectionSet, Error, Result};

use crate::weighted::WeightTable;

/// Minimum score for a pattern to be reported
pub const DISPLAY_THRESHOLD: f64 = 0.4;

/// Patterns described in the summary
pub const SUMMARY_PATTERNS: usize = 3;

/// Pattern names with a category weight table, in evaluation order
pub const CATEGORY_NAMES: [&str; 8] = [
    "defensive_posture",
    "confident_stance",
    "self_soothing",
    "territorial_stance",
    "submissive_posture",
    "power_pose",
    "anxiety_indicators",
    "engagement_signals",
];

fn table(category: &str, entries: &[(&str, f64)]) -> WeightTable {
    WeightTable {
        category: category.to_string(),
        entries: entries.iter().map(|(m, w)| (m.to_string(), *w)).collect(),
    }
}

/// Built-in category tables
pub fn default_categories() -> Vec<WeightTable> {
    vec![
        table(
            "defensive_posture",
            &[
                ("crossed_arms", 0.4),
                ("hunched_shoulders", 0.3),
                ("feet_together", 0.3),
            ],
        ),
        table(
            "confident_stance",
            &[
                ("upright_posture", 0.4),
                ("hands_on_hips", 0.3),
                ("wide_stance", 0.3),
            ],
        ),
        table(
            "self_soothing",
            &[
                ("hand_to_neck", 0.4),
                ("hand_to_face", 0.3),
                ("hand_to_chest", 0.3),
            ],
        ),
        table(
            "territorial_stance",
            &[("wide_stance", 0.5), ("hands_on_hips", 0.5)],
        ),
        table(
            "submissive_posture",
            &[
                ("defensive_posture", 0.4),
                ("closed_stance", 0.3),
                ("self_soothing", 0.3),
            ],
        ),
        table(
            "power_pose",
            &[
                ("confident_stance", 0.5),
                ("arms_open", 0.3),
                ("wide_stance", 0.2),
            ],
        ),
        table(
            "anxiety_indicators",
            &[
                ("fidgeting", 0.4),
                ("self_soothing", 0.3),
                ("defensive_posture", 0.3),
            ],
        ),
        table(
            "engagement_signals",
            &[
                ("leaning_forward", 0.5),
                ("arms_open", 0.3),
                ("open_palms", 0.2),
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyLanguageConfig {
    pub display_threshold: f64,
    pub categories: Vec<WeightTable>,
}

impl Default for BodyLanguageConfig {
    fn default() -> Self {
        Self {
            display_threshold: DISPLAY_THRESHOLD,
            categories: default_categories(),
        }
    }
}

impl BodyLanguageConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.display_threshold.is_finite() || !(0.0..=1.0).contains(&self.display_threshold) {
            return Err(Error::Config(format!(
                "body language display threshold {} outside [0, 1]",
                self.display_threshold
            )));
        }

        for (position, category) in self.categories.iter().enumerate() {
            category.validate()?;

            if self.categories[..position]
                .iter()
                .any(|c| c.category == category.category)
            {
                return Err(Error::Config(format!(
                    "duplicate body language category '{}'",
                    category.category
                )));
            }

            // members may only read categories already computed
            for member in category.members() {
                if self.categories[position..].iter().any(|c| c.category == member) {
                    return Err(Error::Config(format!(
                        "category '{}' reads '{member}' before it is computed",
                        category.category
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Result of one interpretation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyLanguageReport {
    /// Every non-zero primitive and category score
    pub scores: DetectionSet,
    /// Patterns above the display threshold, highest first
    pub patterns: Vec<Detection>,
}

impl BodyLanguageReport {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct BodyLanguageAnalyzer {
    config: BodyLanguageConfig,
}

impl BodyLanguageAnalyzer {
    pub fn new(config: BodyLanguageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BodyLanguageConfig {
        &self.config
    }

    /// Score categories over body primitives and report what clears the threshold
    pub fn analyze(&self, primitives: &DetectionSet) -> BodyLanguageReport {
        let mut scores = primitives.clone();

        for category in &self.config.categories {
            let composite = category.score_set(&scores);
            if composite.score > 0.0 {
                scores.insert(composite.to_detection());
            }
        }

        let mut patterns: Vec<Detection> = scores
            .iter()
            .filter(|d| d.confidence > self.config.display_threshold)
            .cloned()
            .collect();
        sort_by_confidence(&mut patterns);

        BodyLanguageReport { scores, patterns }
    }

    /// Numbered summary of the leading patterns
    pub fn interpretation(&self, report: &BodyLanguageReport) -> String {
        if report.patterns.is_empty() {
            return "No significant body language patterns detected.".to_string();
        }

        let mut lines = vec!["Body Language Analysis:".to_string()];
        for (i, pattern) in report.patterns.iter().take(SUMMARY_PATTERNS).enumerate() {
            lines.push(String::new());
            lines.push(format!(
                "{}. {} ({:.1}%)",
                i + 1,
                title_case(&pattern.name),
                pattern.confidence * 100.0
            ));
            lines.push(format!(
                "   {}",
                describe(&pattern.name).unwrap_or("Unknown pattern")
            ));
        }
        lines.join("\n")
    }
}

impl Default for BodyLanguageAnalyzer {
    fn default() -> Self {
        Self {
            config: BodyLanguageConfig::default(),
        }
    }
}

/// "hand_to_face" → "Hand To Face"
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line reading of a body-language pattern
pub fn describe(pattern: &str) -> Option<&'static str> {
    let text = match pattern {
        "crossed_arms" => "Defensive or closed-off stance, possibly feeling uncomfortable or disagreeable",
        "hands_on_hips" => "Confident, assertive, or potentially confrontational posture",
        "arms_open" => "Open, welcoming, and receptive to interaction",
        "defensive_posture" => "Feeling threatened, uncomfortable, or resistant to the situation",
        "confident_stance" => "Self-assured, comfortable, and in control",
        "leaning_forward" => "Engaged, interested, or showing assertiveness",
        "leaning_back" => "Relaxed, disengaged, or maintaining distance",
        "crossed_legs" => "Formal, reserved, or slightly defensive posture",
        "wide_stance" => "Confident, dominant, or claiming territory",
        "closed_stance" => "Insecure, submissive, or feeling vulnerable",
        "hand_to_face" => "Thinking, processing, or possibly being deceptive",
        "hand_to_neck" => "Feeling stressed, uncomfortable, or anxious",
        "hand_to_chest" => "Showing sincerity, emphasis, or protective instincts",
        "covering_mouth" => "Surprised, shocked, or potentially hiding something",
        "covering_eyes" => "Embarrassed, ashamed, or overwhelmed",
        "fidgeting" => "Nervous, anxious, or restless",
        "pointing" => "Directing attention, making emphasis, or showing authority",
        "open_palms" => "Honest, open, and trustworthy demeanor",
        "clenched_fists" => "Angry, tense, or feeling aggressive",
        "self_soothing" => "Managing stress or anxiety through comfort gestures",
        "territorial_stance" => "Asserting dominance or claiming space",
        "submissive_posture" => "Feeling inferior, insecure, or deferential",
        "power_pose" => "Displaying confidence, authority, and control",
        "anxiety_indicators" => "Showing signs of nervousness, stress, or discomfort",
        "engagement_signals" => "Actively interested, focused, and involved",
        "hunched_shoulders" => "Withdrawn, tired, or trying to appear smaller",
        "upright_posture" => "Alert, balanced, and composed",
        "feet_together" => "Cautious, formal, or holding back",
        _ => return None,
    };
    Some(text)
}

/// Whether a label names a body-language pattern rather than a facial one
pub fn is_body_pattern(label: &str) -> bool {
    describe(label).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_validate() {
        assert!(BodyLanguageConfig::default().validate().is_ok());
        for category in CATEGORY_NAMES {
            assert!(default_categories().iter().any(|c| c.category == category));
        }
    }

    #[test]
    fn test_composite_bounds_with_every_primitive_saturated() {
        let analyzer = BodyLanguageAnalyzer::default();
        let names = [
            "crossed_arms", "hunched_shoulders", "feet_together", "upright_posture",
            "hands_on_hips", "wide_stance", "hand_to_neck", "hand_to_face", "hand_to_chest",
            "closed_stance", "arms_open", "fidgeting", "leaning_forward", "open_palms",
        ];
        let report = analyzer.analyze(&DetectionSet::from_names(names));

        for detection in report.scores.iter() {
            assert!((0.0..=1.0).contains(&detection.confidence), "{}", detection.name);
        }
        for category in CATEGORY_NAMES {
            assert!(report.scores.confidence(category) > 0.99, "{category}");
        }
    }

    #[test]
    fn test_categories_read_earlier_categories() {
        let analyzer = BodyLanguageAnalyzer::default();
        let primitives = DetectionSet::from_detections([
            Detection::new("crossed_arms", 1.0),
            Detection::new("hunched_shoulders", 1.0),
            Detection::new("closed_stance", 0.8),
        ]);
        let report = analyzer.analyze(&primitives);

        // defensive 0.7; submissive 0.7·0.4 + 0.8·0.3
        assert!((report.scores.confidence("defensive_posture") - 0.7).abs() < 1e-9);
        assert!((report.scores.confidence("submissive_posture") - 0.52).abs() < 1e-9);
    }

    #[test]
    fn test_patterns_filtered_and_sorted() {
        let analyzer = BodyLanguageAnalyzer::default();
        let primitives = DetectionSet::from_detections([
            Detection::new("leaning_forward", 0.8),
            Detection::new("crossed_arms", 0.4),
            Detection::new("open_palms", 1.0),
        ]);
        let report = analyzer.analyze(&primitives);

        // crossed_arms sits exactly on the threshold and is not shown;
        // engagement 0.8·0.5 + 1.0·0.2 = 0.6
        assert_eq!(
            report.pattern_names(),
            vec!["open_palms", "leaning_forward", "engagement_signals"]
        );
    }

    #[test]
    fn test_empty_input_is_empty_report() {
        let report = BodyLanguageAnalyzer::default().analyze(&DetectionSet::new());
        assert!(report.is_empty());
        assert!(report.scores.is_empty());
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut config = BodyLanguageConfig::default();
        config.categories.insert(
            0,
            table("early", &[("power_pose", 0.5)]),
        );
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_interpretation_lists_top_three() {
        let analyzer = BodyLanguageAnalyzer::default();
        let primitives = DetectionSet::from_detections([
            Detection::new("open_palms", 1.0),
            Detection::new("leaning_forward", 0.8),
            Detection::new("arms_open", 1.0),
            Detection::new("pointing", 0.5),
        ]);
        let report = analyzer.analyze(&primitives);
        let text = analyzer.interpretation(&report);

        assert!(text.starts_with("Body Language Analysis:"));
        assert!(text.contains("1. Open Palms (100.0%)"));
        assert!(text.contains("3."));
        assert!(!text.contains("4."));
    }

    #[test]
    fn test_body_pattern_names() {
        assert!(is_body_pattern("crossed_arms"));
        assert!(is_body_pattern("engagement_signals"));
        assert!(!is_body_pattern("mouth open"));
    }
}
