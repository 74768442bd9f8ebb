use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;

/// Text-embedding collaborator.
///
/// Equal inputs must produce equal (or negligibly close) vectors. Calls may be
/// slow; implementations must be safe to share across tasks.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order. Providers with a native batch
    /// endpoint override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize;

    /// Short provider name for logs and reports.
    fn provider(&self) -> &'static str;
}

// OpenAI API implementation
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    retries: u32,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAIResponseData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIResponseData>,
}

impl OpenAIEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        dims: Option<usize>,
        retries: u32,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .context("Failed to build reqwest client with timeout")?;

        let dims = dims.unwrap_or(match model.as_str() {
            // Known OpenAI embedding dims
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });

        Ok(Self {
            client,
            api_key,
            model,
            dims,
            retries: retries.max(1),
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = OpenAIRequest {
            model: &self.model,
            input: texts,
        };

        // Retry transport and server faults with exponential backoff
        let mut last_err: Option<anyhow::Error> = None;
        for i in 0..self.retries {
            if i > 0 {
                let delay_ms = 200u64 * (1u64 << (i - 1));
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }

            let response = match self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .context("Failed to send request to OpenAI API")
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                last_err = Some(anyhow::anyhow!(
                    "OpenAI API error {}: {}",
                    status,
                    error_text
                ));
                continue;
            }

            match response
                .json::<OpenAIResponse>()
                .await
                .context("Failed to parse OpenAI response")
            {
                Ok(mut result) => {
                    if result.data.len() != texts.len() {
                        anyhow::bail!(
                            "OpenAI returned {} embeddings for {} inputs",
                            result.data.len(),
                            texts.len()
                        );
                    }
                    result.data.sort_by_key(|d| d.index);
                    return Ok(result.data.into_iter().map(|d| d.embedding).collect());
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Unknown OpenAI embedding error")))
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Generating OpenAI embedding (model={}, chars={})",
            self.model,
            text.len()
        );
        self.request(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .context("No embedding returned from OpenAI")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            "Generating {} OpenAI embeddings (model={})",
            texts.len(),
            self.model
        );
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}

// Deterministic, local FakeEmbedder for testing/dev (no network)
pub struct FakeEmbedder {
    dims: usize,
}

impl FakeEmbedder {
    pub fn new(dims: Option<usize>) -> Self {
        let d = dims.unwrap_or(384).max(1);
        Self { dims: d }
    }

    // Produce a stable stream of pseudo-random f32 values in [-1.0, 1.0)
    fn generate(&self, text: &str) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dims);
        let mut i: u32 = 0;
        while out.len() < self.dims {
            // hash(text || i)
            let mut hasher = blake3::Hasher::new();
            hasher.update(text.as_bytes());
            hasher.update(&i.to_le_bytes());
            let digest = hasher.finalize();
            for chunk in digest.as_bytes().chunks(4) {
                if out.len() >= self.dims {
                    break;
                }
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(chunk);
                let v01 = (u32::from_le_bytes(bytes) as f32) / (u32::MAX as f32 + 1.0);
                out.push(v01 * 2.0 - 1.0);
            }
            i = i.wrapping_add(1);
        }

        // Normalize to unit length to emulate real embeddings
        let norm: f32 = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut out {
                *v /= norm;
            }
        }
        out
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider(&self) -> &'static str {
        "fake"
    }
}

/// Build the embedder selected by configuration.
///
/// `auto` prefers OpenAI when a key is present and otherwise falls back to
/// the deterministic `FakeEmbedder`, unless strict mode forbids the fallback.
pub async fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let system = &config.system;
    let runtime = &config.runtime;

    let is_placeholder = |s: &str| {
        let t = s.trim();
        t.is_empty()
            || t.contains("${")
            || t.eq_ignore_ascii_case("your-api-key-here")
            || t.eq_ignore_ascii_case("changeme")
    };
    let openai_key = runtime
        .openai_api_key
        .as_deref()
        .filter(|k| !is_placeholder(k));
    let dim_override = Some(system.embedding_dimensions).filter(|d| *d > 0);

    match system.embedding_provider.as_str() {
        "openai" => {
            let Some(key) = openai_key else {
                anyhow::bail!("embedding_provider=openai but OPENAI_API_KEY is not set");
            };
            info!("Using OpenAI embeddings (model={})", system.embedding_model);
            return Ok(Arc::new(OpenAIEmbedder::new(
                key.to_string(),
                system.embedding_model.clone(),
                dim_override,
                system.embed_retries,
                runtime.embed_timeout_ms,
            )?));
        }
        "local" | "candle" => {
            let embedder = crate::local_embedder::LocalEmbedder::load(&system.model_dir)?;
            info!(
                "Using local sentence embedder from {} ({} dims)",
                system.model_dir.display(),
                embedder.dimensions()
            );
            return Ok(Arc::new(embedder));
        }
        "fake" => {
            let fake = FakeEmbedder::new(dim_override);
            info!("Using FakeEmbedder with {} dimensions", fake.dimensions());
            return Ok(Arc::new(fake));
        }
        _ => {
            if let Some(key) = openai_key {
                info!("Using OpenAI embeddings (model={})", system.embedding_model);
                return Ok(Arc::new(OpenAIEmbedder::new(
                    key.to_string(),
                    system.embedding_model.clone(),
                    dim_override,
                    system.embed_retries,
                    runtime.embed_timeout_ms,
                )?));
            }
        }
    }

    if runtime.embed_strict {
        anyhow::bail!(
            "No embedding provider configured; set OPENAI_API_KEY or LENS_EMBED_PROVIDER=local."
        );
    }

    let fake = FakeEmbedder::new(dim_override);
    info!(
        "Using FakeEmbedder (deterministic) with {} dimensions",
        fake.dimensions()
    );
    Ok(Arc::new(fake))
}
