//! Engine configuration.

use serde::{Deserialize, Serialize};

use visage_agents::AgentConfig;
use visage_analysis::{BodyLanguageConfig, DeceptionConfig, FidgetConfig, StressConfig};
use visage_core::{Error, Result};
use visage_gestures::CatalogConfig;

use crate::gate::GateConfig;

/// Moments of label history kept for timing analysis
pub const DEFAULT_EXPRESSION_HISTORY: usize = 20;

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Significance gate tuning
    pub gate: GateConfig,

    /// Threshold overrides and extra rules
    pub catalog: CatalogConfig,

    pub body_language: BodyLanguageConfig,

    pub deception: DeceptionConfig,

    pub stress: StressConfig,

    pub fidget: FidgetConfig,

    /// Narrative oracle settings
    pub narrative: AgentConfig,

    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Accepted moments whose labels feed deception timing analysis
    pub expression_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expression_history: DEFAULT_EXPRESSION_HISTORY,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, then `VISAGE_` environment overrides
    pub fn from_file(path: &str) -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()?;

        settings.try_deserialize()
    }

    /// `VISAGE_GATE__MIN_INTERVAL_SECONDS=2` sets `gate.min_interval_seconds`
    fn environment() -> config::Environment {
        config::Environment::with_prefix("VISAGE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Reject anything that would make scores un-auditable, before any frame
    pub fn validate(&self) -> Result<()> {
        self.gate.validate()?;
        self.catalog.validate()?;
        self.body_language.validate()?;
        self.deception.validate()?;
        self.stress.validate()?;

        let fidget = &self.fidget;
        if fidget.window == 0 || fidget.sample == 0 || fidget.sample > fidget.window {
            return Err(Error::Config(format!(
                "fidget sample {} must be within window {}",
                fidget.sample, fidget.window
            )));
        }
        for value in [fidget.min_movement, fidget.max_movement, fidget.confidence] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("fidget value {value} must be finite and >= 0")));
            }
        }
        if fidget.min_movement >= fidget.max_movement || fidget.confidence > 1.0 {
            return Err(Error::Config("fidget movement bounds or confidence out of range".into()));
        }

        if self.narrative.timeout_ms == 0 {
            return Err(Error::Config("narrative timeout_ms must be positive".into()));
        }
        if self.session.expression_history == 0 {
            return Err(Error::Config("session expression_history must be positive".into()));
        }
        Ok(())
    }
}
