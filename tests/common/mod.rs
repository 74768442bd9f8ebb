//! Stub embedders and small datasets shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cultural_lens::embeddings::{Embedder, FakeEmbedder};
use cultural_lens::exemplars::ExemplarCorpus;
use cultural_lens::{CultureRegistry, ProfileInferencer};

/// Counts single-text `embed` calls; batch calls are not counted.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: FakeEmbedder::new(Some(32)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn provider(&self) -> &'static str {
        "counting"
    }
}

const VOCAB: &[&str] = &[
    "independence",
    "freedom",
    "personal",
    "choice",
    "family",
    "harmony",
    "group",
    "duty",
    "authority",
    "hierarchy",
    "respect",
    "elders",
    "equality",
    "fairness",
    "consultation",
];

/// Bag-of-keywords vectors: one component per vocabulary word plus a
/// constant bias component.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mut v: Vec<f32> = VOCAB
            .iter()
            .map(|k| words.iter().filter(|w| *w == k).count() as f32)
            .collect();
        v.push(1.0);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        VOCAB.len() + 1
    }

    fn provider(&self) -> &'static str {
        "keyword"
    }
}

pub fn keyword_exemplars() -> ExemplarCorpus {
    ExemplarCorpus::from_toml_str(
        r#"
        [individualism]
        high = ["independence freedom personal choice"]
        low = ["family harmony group duty"]

        [power_distance]
        high = ["authority hierarchy respect elders"]
        low = ["equality fairness consultation"]
        "#,
    )
    .unwrap()
}

pub fn test_registry() -> Arc<CultureRegistry> {
    Arc::new(
        CultureRegistry::from_toml_str(
            r#"
            [[culture]]
            id = "baseline"

            [[culture]]
            id = "Collectivia"
            [culture.scores]
            individualism = -2.0
            power_distance = 2.0

            [[culture]]
            id = "Individualia"
            [culture.scores]
            individualism = 2.0
            power_distance = -2.0

            [[culture]]
            id = "Harmonia"
            [culture.scores]
            indulgence = 1.0

            [[culture]]
            id = "Blank"
            "#,
        )
        .unwrap(),
    )
}

pub const COLLECTIVIST_RESPONSE: &str = "DECISION: Option B\n\
TOP_VALUES:\n\
1. Family Harmony\n\
2. Respect for Elders\n\
3. Duty\n\
EXPLANATION: The group and family come first; we defer to authority and hierarchy.";

pub async fn keyword_inferencer() -> ProfileInferencer {
    ProfileInferencer::new(Arc::new(KeywordEmbedder), &keyword_exemplars())
        .await
        .unwrap()
}
