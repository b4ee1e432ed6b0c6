//! Shared, stateless engine parts and session construction.

use std::sync::Arc;

use visage_agents::NarrativeOracle;
use visage_analysis::{BodyLanguageAnalyzer, DeceptionScorer, StressScorer};
use visage_core::{Error, Result};
use visage_gestures::{GestureEvaluator, PredicateCatalog};

use crate::config::EngineConfig;
use crate::session::StreamSession;
use crate::sink::MomentSink;

/// Everything sessions share read-only: catalog, scorers, oracle and sink
pub struct VisageEngine {
    pub(crate) config: EngineConfig,
    pub(crate) evaluator: GestureEvaluator,
    pub(crate) body_language: BodyLanguageAnalyzer,
    pub(crate) deception: DeceptionScorer,
    pub(crate) stress: StressScorer,
    pub(crate) oracle: Arc<dyn NarrativeOracle>,
    pub(crate) sink: Arc<dyn MomentSink>,
}

impl VisageEngine {
    /// Validate the configuration and build the catalog it describes
    pub fn new(
        config: EngineConfig,
        oracle: Arc<dyn NarrativeOracle>,
        sink: Arc<dyn MomentSink>,
    ) -> Result<Arc<Self>> {
        let catalog = PredicateCatalog::from_config(&config.catalog)?;
        Self::with_catalog(config, Arc::new(catalog), oracle, sink)
    }

    /// Use a prebuilt catalog; `config.catalog` is ignored
    pub fn with_catalog(
        config: EngineConfig,
        catalog: Arc<PredicateCatalog>,
        oracle: Arc<dyn NarrativeOracle>,
        sink: Arc<dyn MomentSink>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        tracing::info!(
            predicates = catalog.len(),
            oracle = oracle.name(),
            min_interval_seconds = config.gate.min_interval_seconds,
            "Engine ready"
        );

        Ok(Arc::new(Self {
            evaluator: GestureEvaluator::new(catalog),
            body_language: BodyLanguageAnalyzer::new(config.body_language.clone())?,
            deception: DeceptionScorer::new(config.deception.clone())?,
            stress: StressScorer::new(&config.stress)?,
            config,
            oracle,
            sink,
        }))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<PredicateCatalog> {
        self.evaluator.catalog()
    }

    /// Open a stream; must be called inside a tokio runtime
    pub fn start_session(self: &Arc<Self>) -> Result<StreamSession> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::InvalidInput(format!("sessions need a tokio runtime: {e}")))?;
        StreamSession::start(Arc::clone(self), &runtime)
    }
}

impl std::fmt::Debug for VisageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisageEngine")
            .field("predicates", &self.catalog().len())
            .field("oracle", &self.oracle.name())
            .finish()
    }
}
