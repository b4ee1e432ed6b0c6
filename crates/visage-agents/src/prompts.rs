//! Prompt templates for narrative oracles.

use serde::{Deserialize, Serialize};
use visage_analysis::is_body_pattern;

/// System prompt when only facial labels are present
pub const FACIAL_SYSTEM_PROMPT: &str = r#"You are an expert psychologist specializing in facial expression analysis and emotional intelligence. You have deep knowledge of micro-expressions, emotional psychology, and non-verbal communication. Provide insightful, empathetic, and accurate emotional interpretations based on facial gestures and expressions. Always maintain a professional and supportive tone."#;

/// System prompt when body-language labels accompany the facial ones
pub const FACIAL_BODY_SYSTEM_PROMPT: &str = r#"You are an expert psychologist specializing in facial expression analysis, body language, and emotional intelligence. You have deep knowledge of micro-expressions, emotional psychology, non-verbal communication, and body language interpretation. Provide insightful, empathetic, and accurate emotional interpretations based on facial gestures, expressions, and body positioning. Always maintain a professional and supportive tone."#;

/// System prompt for reading a sequence of moments
pub const PATTERN_SYSTEM_PROMPT: &str = r#"You are an expert in emotional pattern analysis and psychological assessment. You specialize in interpreting sequences of facial expressions to understand emotional states, mood patterns, and psychological wellbeing over time."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Facial,
    FacialAndBody,
}

impl PromptKind {
    /// Body prompt as soon as one label is a body-language pattern
    pub fn for_labels(labels: &[String]) -> Self {
        if labels.iter().any(|l| is_body_pattern(l)) {
            PromptKind::FacialAndBody
        } else {
            PromptKind::Facial
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            PromptKind::Facial => FACIAL_SYSTEM_PROMPT,
            PromptKind::FacialAndBody => FACIAL_BODY_SYSTEM_PROMPT,
        }
    }
}

/// Format the user turn for one moment's labels
pub fn format_user_prompt(kind: PromptKind, labels: &[String]) -> String {
    let event_text = labels.join(", ");
    match kind {
        PromptKind::Facial => format!(
            r#"The user displayed the following facial expressions and gestures: {event_text}.

Please provide a concise emotional analysis that includes:
1. The likely emotional state or mood
2. Possible underlying feelings or thoughts
3. Social or psychological context if applicable

Keep your response between 150-250 words and focus on comprehensive psychological insights rather than technical descriptions."#
        ),
        PromptKind::FacialAndBody => format!(
            r#"The user displayed the following facial expressions, gestures, and body language: {event_text}.

Please provide a comprehensive emotional analysis that includes:
1. The likely emotional state or mood
2. Possible underlying feelings or thoughts
3. Social or psychological context if applicable
4. How their body language and posture reflect their confidence, comfort level, or emotional barriers
5. What their positioning and gestures might suggest about their intentions or psychological state

Keep your response between 150-250 words and focus on psychological insights combining both facial and body language."#
        ),
    }
}

/// Format the user turn for a timeline of label sets
pub fn format_pattern_prompt(timeline: &[Vec<String>]) -> String {
    let sequence = timeline
        .iter()
        .map(|labels| labels.join(", "))
        .collect::<Vec<_>>()
        .join(" → ");

    format!(
        r#"Analyze this sequence of facial expressions over time: {sequence}

Please provide insights about:
1. Overall emotional trend or pattern
2. Emotional stability or volatility
3. Potential emotional triggers or themes
4. General psychological state assessment

Keep your response concise and focused on meaningful patterns."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_facial_only_prompt() {
        let kind = PromptKind::for_labels(&labels(&["smile", "raised eyebrow"]));
        assert_eq!(kind, PromptKind::Facial);
        assert_eq!(kind.system_prompt(), FACIAL_SYSTEM_PROMPT);
    }

    #[test]
    fn test_body_label_switches_prompt() {
        let names = labels(&["smile", "crossed_arms"]);
        let kind = PromptKind::for_labels(&names);
        assert_eq!(kind, PromptKind::FacialAndBody);

        let prompt = format_user_prompt(kind, &names);
        assert!(prompt.contains("smile, crossed_arms"));
        assert!(prompt.contains("body language and posture"));
    }

    #[test]
    fn test_pattern_prompt_joins_timeline() {
        let prompt = format_pattern_prompt(&[labels(&["smile"]), labels(&["frown", "squint"])]);
        assert!(prompt.contains("smile → frown, squint"));
    }
}
