//! Cultural-alignment scoring for LLM responses.
//!
//! Raw model text is parsed into a [`StructuredResponse`], mapped onto a
//! six-dimension [`CulturalProfile`] by embedding similarity to pole
//! exemplars, and scored against reference cultures.

pub mod alignment;
pub mod baseline;
pub mod config;
pub mod dimension;
pub mod embeddings;
pub mod error;
pub mod evaluator;
pub mod exemplars;
pub mod extract;
pub mod inference;
pub mod local_embedder;
pub mod profile;
pub mod scenario;
pub mod stereotype;
pub mod utils;

pub use alignment::{AlignmentScore, AlignmentScorer};
pub use baseline::{closest_culture, estimate_baseline_bias, rank_cultures};
pub use dimension::CulturalDimension;
pub use error::{LensError, Result};
pub use evaluator::{AggregateMetrics, CulturalEvaluator, EvaluationMetrics, aggregate_metrics};
pub use extract::{Decision, StructuredResponse, extract};
pub use inference::ProfileInferencer;
pub use profile::{BASELINE_CULTURE, CultureRegistry, CulturalProfile, ReferenceProfile};
pub use scenario::{ScenarioCatalog, ScenarioLookup, ScenarioSpec};
pub use stereotype::StereotypeScorer;
