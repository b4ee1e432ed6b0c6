//! Offline narrator: deterministic commentary assembled from label readings.
//!
//! Useful where no remote model is configured, and as the reference oracle
//! in tests. Facial labels are matched against a keyword table; body labels
//! use the body-language pattern descriptions.

use async_trait::async_trait;
use visage_analysis::{describe, is_body_pattern, title_case};

use crate::agent::{AgentResult, NarrativeOracle, NarrativeRequest};

/// Keyword → emotional reading, first match wins per label
const FACIAL_READINGS: &[(&str, &str)] = &[
    ("smile", "warmth or amusement"),
    ("grin", "warmth or amusement"),
    ("laugh", "warmth or amusement"),
    ("frown", "displeasure or concern"),
    ("sad", "sadness"),
    ("furrow", "concentration or tension"),
    ("squint", "scrutiny or discomfort"),
    ("clench", "suppressed tension"),
    ("compress", "suppressed tension"),
    ("wide", "surprise or alertness"),
    ("mouth open", "surprise or alertness"),
    ("raised", "curiosity or surprise"),
    ("wrinkle", "distaste"),
    ("sneer", "contempt"),
    ("avoid", "discomfort or withdrawal"),
    ("contact", "attentiveness"),
    ("blink", "stress or fatigue"),
    ("tilt", "interest or uncertainty"),
    ("neutral", "composure"),
    ("relaxed", "composure"),
];

pub struct InterpretiveNarrator {
    name: String,
}

impl InterpretiveNarrator {
    pub fn new() -> Self {
        Self {
            name: "Interpretive Narrator".to_string(),
        }
    }

    fn facial_reading(label: &str) -> Option<&'static str> {
        let lower = label.to_lowercase();
        FACIAL_READINGS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, reading)| *reading)
    }

    /// Compose the commentary for a label list
    pub fn compose(&self, labels: &[String]) -> String {
        let (body, facial): (Vec<&String>, Vec<&String>) =
            labels.iter().partition(|l| is_body_pattern(l));

        let mut readings: Vec<&str> = Vec::new();
        for reading in facial.iter().filter_map(|l| Self::facial_reading(l)) {
            if !readings.contains(&reading) {
                readings.push(reading);
            }
        }

        let mut paragraphs = Vec::new();
        if !facial.is_empty() {
            let cues = facial.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ");
            let reading = if readings.is_empty() {
                "no single dominant emotion".to_string()
            } else {
                readings.join(", ")
            };
            paragraphs.push(format!("Facial cues ({cues}) point to {reading}."));
        }

        let body_lines: Vec<String> = body
            .iter()
            .filter_map(|l| describe(l).map(|text| format!("{}: {text}.", title_case(l))))
            .collect();
        if !body_lines.is_empty() {
            paragraphs.push(format!("Body language: {}", body_lines.join(" ")));
        }

        paragraphs.join("\n\n")
    }
}

impl Default for InterpretiveNarrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NarrativeOracle for InterpretiveNarrator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn narrate(&self, request: &NarrativeRequest) -> AgentResult<String> {
        self.validate_request(request)?;
        Ok(self.compose(&request.labels))
    }
}
