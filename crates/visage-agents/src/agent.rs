//! Oracle trait and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::prompts::{format_user_prompt, PromptKind};

/// Result type for oracle operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Oracle error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("LLM inference error: {0}")]
    LlmError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

impl From<AgentError> for visage_core::Error {
    fn from(e: AgentError) -> Self {
        visage_core::Error::OracleUnavailable(e.to_string())
    }
}

/// What the oracle is asked to narrate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub labels: Vec<String>,
    /// Encoded frame that produced the labels, when the oracle accepts images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
}

impl NarrativeRequest {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels, image: None }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn prompt_kind(&self) -> PromptKind {
        PromptKind::for_labels(&self.labels)
    }

    pub fn system_prompt(&self) -> &'static str {
        self.prompt_kind().system_prompt()
    }

    pub fn user_prompt(&self) -> String {
        format_user_prompt(self.prompt_kind(), &self.labels)
    }
}

/// Anything that turns a label list into commentary
#[async_trait]
pub trait NarrativeOracle: Send + Sync {
    fn name(&self) -> &str;

    async fn narrate(&self, request: &NarrativeRequest) -> AgentResult<String>;

    fn validate_request(&self, request: &NarrativeRequest) -> AgentResult<()> {
        if request.labels.iter().all(|l| l.trim().is_empty()) {
            Err(AgentError::InvalidInput("no labels to narrate".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Oracle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Oracle response with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    pub oracle: String,
    pub content: String,
    pub generation_time_ms: u64,
}

impl fmt::Display for NarrativeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}ms)", self.oracle, self.content, self.generation_time_ms)
    }
}

/// Validate, call and time-bound one narrative request
pub async fn narrate_with_timeout(
    oracle: &dyn NarrativeOracle,
    request: &NarrativeRequest,
    timeout: Duration,
) -> AgentResult<NarrativeResponse> {
    oracle.validate_request(request)?;

    let started = Instant::now();
    let content = tokio::time::timeout(timeout, oracle.narrate(request))
        .await
        .map_err(|_| AgentError::Timeout(timeout.as_millis() as u64))??;
    let generation_time_ms = started.elapsed().as_millis() as u64;

    tracing::debug!(
        oracle = oracle.name(),
        labels = request.labels.len(),
        generation_time_ms,
        "narrative generated"
    );

    Ok(NarrativeResponse {
        oracle: oracle.name().to_string(),
        content: content.trim().to_string(),
        generation_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowOracle;

    #[async_trait]
    impl NarrativeOracle for SlowOracle {
        fn name(&self) -> &str {
            "slow"
        }

        async fn narrate(&self, _request: &NarrativeRequest) -> AgentResult<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("late".to_string())
        }
    }

    struct EchoOracle;

    #[async_trait]
    impl NarrativeOracle for EchoOracle {
        fn name(&self) -> &str {
            "echo"
        }

        async fn narrate(&self, request: &NarrativeRequest) -> AgentResult<String> {
            Ok(format!("  {}  ", request.labels.join(", ")))
        }
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let config: AgentConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_response_display() {
        let response = NarrativeResponse {
            oracle: "echo".to_string(),
            content: "Hello world".to_string(),
            generation_time_ms: 150,
        };
        let display = format!("{}", response);
        assert!(display.contains("echo"));
        assert!(display.contains("Hello world"));
    }

    #[test]
    fn test_error_maps_to_oracle_unavailable() {
        let err: visage_core::Error = AgentError::RateLimit.into();
        assert!(matches!(err, visage_core::Error::OracleUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let request = NarrativeRequest::new(vec!["smile".to_string()]);
        let result = narrate_with_timeout(&SlowOracle, &request, Duration::from_millis(20)).await;
        assert_eq!(result, Err(AgentError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_empty_labels_rejected() {
        let result =
            narrate_with_timeout(&EchoOracle, &NarrativeRequest::default(), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_content_trimmed() {
        let request = NarrativeRequest::new(vec!["smile".to_string(), "mouth open".to_string()]);
        let response = narrate_with_timeout(&EchoOracle, &request, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.content, "smile, mouth open");
        assert_eq!(response.oracle, "echo");
    }
}
