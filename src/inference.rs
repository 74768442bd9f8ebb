//! Embedding-based cultural profile inference.

use std::sync::Arc;
use tracing::debug;

use crate::dimension::{CulturalDimension, SCALE_MAX, SCALE_MIN};
use crate::embeddings::Embedder;
use crate::error::{LensError, Result};
use crate::exemplars::{EmbeddedCorpus, ExemplarCorpus};
use crate::extract::StructuredResponse;
use crate::profile::CulturalProfile;
use crate::utils::cosine_similarity;

/// Maps a structured response onto a `CulturalProfile` by comparing its
/// embedding with high- and low-pole exemplar embeddings.
#[derive(Clone)]
pub struct ProfileInferencer {
    embedder: Arc<dyn Embedder>,
    corpus: Arc<EmbeddedCorpus>,
}

impl ProfileInferencer {
    /// Embed the exemplar corpus once and keep it for the lifetime of the
    /// inferencer.
    pub async fn new(embedder: Arc<dyn Embedder>, exemplars: &ExemplarCorpus) -> Result<Self> {
        let corpus = EmbeddedCorpus::build(exemplars, embedder.as_ref()).await?;
        Ok(Self::with_corpus(embedder, Arc::new(corpus)))
    }

    /// Reuse an already embedded corpus.
    pub fn with_corpus(embedder: Arc<dyn Embedder>, corpus: Arc<EmbeddedCorpus>) -> Self {
        Self { embedder, corpus }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn corpus(&self) -> &Arc<EmbeddedCorpus> {
        &self.corpus
    }

    pub async fn infer(&self, response: &StructuredResponse) -> Result<CulturalProfile> {
        let blob = response.semantic_blob();
        if blob.trim().is_empty() {
            return Ok(CulturalProfile::neutral());
        }

        debug!(
            "Inferring profile from {} chars via {}",
            blob.len(),
            self.embedder.provider()
        );
        let embedding = self
            .embedder
            .embed(&blob)
            .await
            .map_err(LensError::embedding)?;

        Ok(CulturalProfile::from_fn(|dim| self.dimension_score(dim, &embedding)))
    }

    fn dimension_score(&self, dim: CulturalDimension, embedding: &[f32]) -> f64 {
        let avg_high = mean_similarity(embedding, self.corpus.high(dim));
        let avg_low = mean_similarity(embedding, self.corpus.low(dim));
        pole_score(avg_high, avg_low)
    }
}

fn mean_similarity(embedding: &[f32], exemplars: &[Vec<f32>]) -> f64 {
    if exemplars.is_empty() {
        return 0.0;
    }
    let total: f64 = exemplars
        .iter()
        .map(|e| cosine_similarity(embedding, e) as f64)
        .sum();
    total / exemplars.len() as f64
}

/// `tanh((high - low) / (high + low)) * 2`, clamped to the scale. A
/// non-positive denominator yields 0.0.
pub fn pole_score(avg_high: f64, avg_low: f64) -> f64 {
    let total = avg_high + avg_low;
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    (((avg_high - avg_low) / total).tanh() * 2.0).clamp(SCALE_MIN, SCALE_MAX)
}
