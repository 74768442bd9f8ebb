//! One-stop evaluation: alignment and stereotype metrics per response.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::alignment::{AlignmentScore, AlignmentScorer};
use crate::baseline::estimate_baseline_bias;
use crate::config::Config;
use crate::embeddings::{Embedder, create_embedder};
use crate::error::{LensError, Result};
use crate::exemplars::ExemplarCorpus;
use crate::extract::StructuredResponse;
use crate::inference::ProfileInferencer;
use crate::profile::{CultureRegistry, CulturalProfile};
use crate::scenario::{ScenarioCatalog, ScenarioLookup, ScenarioSpec};
use crate::stereotype::StereotypeScorer;
use crate::utils::{mean, std_dev};

/// Metrics for a single response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub alignment: AlignmentScore,
    pub stereotype: f64,
}

/// Summary over many responses. Not-applicable alignments are excluded from
/// the alignment statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateMetrics {
    pub count: usize,
    pub applicable: usize,
    pub mean_alignment: f64,
    pub std_alignment: f64,
    pub mean_stereotype: f64,
}

pub fn aggregate_metrics(metrics: &[EvaluationMetrics]) -> AggregateMetrics {
    let alignments: Vec<f64> = metrics.iter().filter_map(|m| m.alignment.value()).collect();
    let stereotypes: Vec<f64> = metrics.iter().map(|m| m.stereotype).collect();
    AggregateMetrics {
        count: metrics.len(),
        applicable: alignments.len(),
        mean_alignment: mean(&alignments),
        std_alignment: std_dev(&alignments),
        mean_stereotype: mean(&stereotypes),
    }
}

/// Bundles the scorers with the datasets they read.
#[derive(Clone)]
pub struct CulturalEvaluator {
    alignment: AlignmentScorer,
    stereotype: StereotypeScorer,
    scenarios: Arc<ScenarioCatalog>,
}

impl CulturalEvaluator {
    pub async fn new(
        embedder: Arc<dyn Embedder>,
        exemplars: &ExemplarCorpus,
        registry: CultureRegistry,
        scenarios: ScenarioCatalog,
        stereotype: StereotypeScorer,
    ) -> Result<Self> {
        let inferencer = ProfileInferencer::new(embedder, exemplars).await?;
        Ok(Self {
            alignment: AlignmentScorer::new(inferencer, Arc::new(registry)),
            stereotype,
            scenarios: Arc::new(scenarios),
        })
    }

    /// Build the embedder and datasets named by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(config)
            .await
            .map_err(|e| LensError::EmbedderUnavailable {
                message: e.to_string(),
            })?;
        let registry = config.data.cultures()?;
        let scenarios = config.data.scenarios()?;
        let exemplars = config.data.exemplars()?;
        let stereotype = StereotypeScorer::new(&config.stereotype.indicators)?;
        info!(
            "Evaluator ready: {} cultures, {} scenarios, {} embedder",
            registry.len(),
            scenarios.len(),
            embedder.provider()
        );
        Self::new(embedder, &exemplars, registry, scenarios, stereotype).await
    }

    pub fn registry(&self) -> &CultureRegistry {
        self.alignment.registry()
    }

    pub fn scenarios(&self) -> &ScenarioCatalog {
        &self.scenarios
    }

    pub async fn evaluate(
        &self,
        response: &StructuredResponse,
        culture: &str,
        scenario: &ScenarioSpec,
    ) -> Result<EvaluationMetrics> {
        let alignment = self
            .alignment
            .score_scenario(response, culture, scenario)
            .await?;
        Ok(EvaluationMetrics {
            alignment,
            stereotype: self.stereotype.score(response),
        })
    }

    /// Evaluate against a scenario from the catalog.
    pub async fn evaluate_by_id(
        &self,
        response: &StructuredResponse,
        culture: &str,
        scenario_id: &str,
    ) -> Result<EvaluationMetrics> {
        let scenario = self
            .scenarios
            .get_scenario(scenario_id)
            .ok_or_else(|| LensError::Validation {
                message: format!("unknown scenario '{}'", scenario_id),
            })?;
        self.evaluate(response, culture, scenario).await
    }

    pub async fn infer(&self, response: &StructuredResponse) -> Result<CulturalProfile> {
        self.alignment.inferencer().infer(response).await
    }

    /// Distance from baseline responses to each comparable culture.
    pub async fn baseline_bias(
        &self,
        responses: &[(StructuredResponse, String)],
    ) -> Result<BTreeMap<String, f64>> {
        estimate_baseline_bias(
            responses,
            &*self.scenarios,
            self.registry(),
            self.alignment.inferencer(),
        )
        .await
    }
}
