//! Pole exemplar phrases and their pre-computed embeddings.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::dimension::CulturalDimension;
use crate::embeddings::Embedder;
use crate::error::{LensError, Result};

const BUILTIN_EXEMPLARS: &str = include_str!("../data/exemplars.toml");

/// High- and low-pole phrases for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolePhrases {
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// Ordered exemplar phrases per dimension. Dimensions absent from the source
/// carry empty pole lists.
#[derive(Debug, Clone, Default)]
pub struct ExemplarCorpus {
    poles: BTreeMap<CulturalDimension, PolePhrases>,
}

impl ExemplarCorpus {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_EXEMPLARS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LensError::dataset("exemplars", format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let poles: BTreeMap<CulturalDimension, PolePhrases> = toml::from_str(content)
            .map_err(|e| LensError::dataset("exemplars", e.to_string()))?;
        Ok(Self { poles })
    }

    pub fn from_poles(poles: impl IntoIterator<Item = (CulturalDimension, PolePhrases)>) -> Self {
        Self {
            poles: poles.into_iter().collect(),
        }
    }

    pub fn high(&self, dim: CulturalDimension) -> &[String] {
        self.poles.get(&dim).map(|p| p.high.as_slice()).unwrap_or(&[])
    }

    pub fn low(&self, dim: CulturalDimension) -> &[String] {
        self.poles.get(&dim).map(|p| p.low.as_slice()).unwrap_or(&[])
    }

    pub fn phrase_count(&self) -> usize {
        self.poles.values().map(|p| p.high.len() + p.low.len()).sum()
    }
}

#[derive(Debug, Clone, Default)]
struct PoleEmbeddings {
    high: Vec<Vec<f32>>,
    low: Vec<Vec<f32>>,
}

/// Exemplar embeddings, computed once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCorpus {
    poles: BTreeMap<CulturalDimension, PoleEmbeddings>,
}

impl EmbeddedCorpus {
    /// Embed every phrase of `corpus` in a single batch.
    pub async fn build(corpus: &ExemplarCorpus, embedder: &dyn Embedder) -> Result<Self> {
        let mut texts = Vec::with_capacity(corpus.phrase_count());
        for dim in CulturalDimension::ALL {
            texts.extend(corpus.high(dim).iter().cloned());
            texts.extend(corpus.low(dim).iter().cloned());
        }

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embedder
                .embed_batch(&texts)
                .await
                .map_err(LensError::embedding)?
        };
        if vectors.len() != texts.len() {
            return Err(LensError::embedding(anyhow::anyhow!(
                "embedder returned {} vectors for {} exemplar phrases",
                vectors.len(),
                texts.len()
            )));
        }

        let mut iter = vectors.into_iter();
        let mut poles = BTreeMap::new();
        for dim in CulturalDimension::ALL {
            let high: Vec<Vec<f32>> = iter.by_ref().take(corpus.high(dim).len()).collect();
            let low: Vec<Vec<f32>> = iter.by_ref().take(corpus.low(dim).len()).collect();
            poles.insert(dim, PoleEmbeddings { high, low });
        }

        info!(
            "Embedded {} exemplar phrases with {} provider",
            texts.len(),
            embedder.provider()
        );
        Ok(Self { poles })
    }

    pub fn high(&self, dim: CulturalDimension) -> &[Vec<f32>] {
        self.poles.get(&dim).map(|p| p.high.as_slice()).unwrap_or(&[])
    }

    pub fn low(&self, dim: CulturalDimension) -> &[Vec<f32>] {
        self.poles.get(&dim).map(|p| p.low.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::FakeEmbedder;

    #[test]
    fn builtin_corpus_has_five_per_pole() {
        let corpus = ExemplarCorpus::builtin().unwrap();
        for dim in CulturalDimension::ALL {
            assert_eq!(corpus.high(dim).len(), 5, "{dim}");
            assert_eq!(corpus.low(dim).len(), 5, "{dim}");
        }
        assert_eq!(corpus.phrase_count(), 60);
    }

    #[test]
    fn missing_dimensions_are_empty() {
        let corpus =
            ExemplarCorpus::from_toml_str("[indulgence]\nhigh = [\"enjoying life\"]\n").unwrap();
        assert_eq!(corpus.high(CulturalDimension::Indulgence).len(), 1);
        assert!(corpus.low(CulturalDimension::Indulgence).is_empty());
        assert!(corpus.high(CulturalDimension::Individualism).is_empty());
    }

    #[test]
    fn unknown_dimension_is_rejected() {
        let err = ExemplarCorpus::from_toml_str("[harmony]\nhigh = [\"x\"]\n").unwrap_err();
        assert!(matches!(err, LensError::Dataset { .. }));
    }

    #[tokio::test]
    async fn embedded_corpus_keeps_pole_layout() {
        let corpus = ExemplarCorpus::builtin().unwrap();
        let fake = FakeEmbedder::new(Some(8));
        let embedded = EmbeddedCorpus::build(&corpus, &fake).await.unwrap();
        let dim = CulturalDimension::PowerDistance;
        assert_eq!(embedded.high(dim).len(), 5);
        assert_eq!(
            embedded.low(dim)[2],
            fake.embed(&corpus.low(dim)[2]).await.unwrap()
        );
    }
}
