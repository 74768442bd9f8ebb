use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use crate::embeddings::Embedder;

/// Sentence embedder running a BERT-family model (e.g. all-MiniLM-L6-v2)
/// from a local directory holding `tokenizer.json`, `config.json` and
/// `model.safetensors`.
pub struct LocalEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dims: usize,
}

impl LocalEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        #[cfg(feature = "metal")]
        let device = Device::new_metal(0).unwrap_or(Device::Cpu);
        #[cfg(not(feature = "metal"))]
        let device = Device::Cpu;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load tokenizer from {}: {}",
                tokenizer_path.display(),
                e
            )
        })?;

        let config_path = model_dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config =
            serde_json::from_str(&config_str).context("Failed to parse config.json")?;

        truncate_to(&mut tokenizer, config.max_position_embeddings)?;

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dims: config.hidden_size,
        })
    }

    /// Masked mean over tokens followed by L2 normalization.
    fn mean_pooling(&self, embeddings: &Tensor, attention_mask: &Tensor) -> Result<Vec<f32>> {
        let mask_expanded = attention_mask.unsqueeze(2)?;
        let summed = embeddings.broadcast_mul(&mask_expanded)?.sum(1)?;
        let mask_sum = mask_expanded.sum(1)?;
        let mean = summed.broadcast_div(&mask_sum)?;

        let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean.broadcast_div(&norm)?;
        Ok(normalized.squeeze(0)?.to_vec1::<f32>()?)
    }
}

/// Cap encodings at the model's position table; longer inputs would index
/// past the position embeddings.
fn truncate_to(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("Failed to set truncation to {}: {}", max_length, e))?;
    Ok(())
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let token_ids = encoding.get_ids();
        debug!("Local embedding over {} tokens", token_ids.len());
        let type_ids = vec![0u32; token_ids.len()];
        let mask: Vec<f32> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as f32)
            .collect();

        let input_ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(type_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let attention = Tensor::new(mask.as_slice(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention))?;
        self.mean_pooling(&hidden, &attention)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider(&self) -> &'static str {
        "local"
    }
}
