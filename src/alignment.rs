//! Distance-based alignment scoring against reference profiles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dimension::CulturalDimension;
use crate::error::Result;
use crate::extract::StructuredResponse;
use crate::inference::ProfileInferencer;
use crate::profile::{CultureRegistry, CulturalProfile, ReferenceProfile, is_baseline};
use crate::scenario::ScenarioSpec;
use crate::utils::rms;

pub const MAX_SCORE: f64 = 10.0;
/// Score lost per unit of RMS distance.
pub const DISTANCE_PENALTY: f64 = 2.5;
/// Score reported when no relevant dimension has a reference value.
pub const NO_COMPARABLE_SCORE: f64 = 5.0;

/// Outcome of scoring one response against one culture.
///
/// Serializes as a number, or `null` when not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum AlignmentScore {
    Score(f64),
    NotApplicable,
}

impl AlignmentScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            AlignmentScore::Score(v) => Some(*v),
            AlignmentScore::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, AlignmentScore::Score(_))
    }
}

impl From<Option<f64>> for AlignmentScore {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AlignmentScore::NotApplicable, AlignmentScore::Score)
    }
}

impl From<AlignmentScore> for Option<f64> {
    fn from(score: AlignmentScore) -> Self {
        score.value()
    }
}

impl fmt::Display for AlignmentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentScore::Score(v) => write!(f, "{:.2}", v),
            AlignmentScore::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// RMS distance between `reference` and `inferred` over the dimensions of
/// `dims` that have a reference value. `None` if there are none.
pub fn rms_distance<'a>(
    reference: &ReferenceProfile,
    inferred: &CulturalProfile,
    dims: impl IntoIterator<Item = &'a CulturalDimension>,
) -> Option<f64> {
    let squared: Vec<f64> = dims
        .into_iter()
        .filter_map(|d| reference.get(*d).map(|r| (r - inferred.get(*d)).powi(2)))
        .collect();
    rms(&squared)
}

/// `max(0, 10 - 2.5 * distance)`.
pub fn score_from_distance(distance: f64) -> f64 {
    (MAX_SCORE - DISTANCE_PENALTY * distance).max(0.0)
}

/// Scores responses against the reference cultures of a registry.
#[derive(Clone)]
pub struct AlignmentScorer {
    inferencer: ProfileInferencer,
    registry: Arc<CultureRegistry>,
}

impl AlignmentScorer {
    pub fn new(inferencer: ProfileInferencer, registry: Arc<CultureRegistry>) -> Self {
        Self {
            inferencer,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<CultureRegistry> {
        &self.registry
    }

    pub fn inferencer(&self) -> &ProfileInferencer {
        &self.inferencer
    }

    /// Score `response` against `culture` over `relevant_dimensions`.
    ///
    /// The checks run in a fixed order: failed extraction (0.0), baseline
    /// (not applicable), unknown culture (0.0), reference without values
    /// (not applicable), no comparable dimension (5.0). Only then is the
    /// profile inferred.
    pub async fn score(
        &self,
        response: &StructuredResponse,
        culture: &str,
        relevant_dimensions: &BTreeSet<CulturalDimension>,
    ) -> Result<AlignmentScore> {
        if !response.extraction_succeeded() {
            return Ok(AlignmentScore::Score(0.0));
        }
        if is_baseline(culture) {
            return Ok(AlignmentScore::NotApplicable);
        }
        let Some(reference) = self.registry.reference(culture) else {
            warn!("Unknown culture '{}'; scoring 0.0", culture);
            return Ok(AlignmentScore::Score(0.0));
        };
        if reference.is_undefined() {
            warn!(
                "Culture '{}' has no reference values; alignment not applicable",
                culture
            );
            return Ok(AlignmentScore::NotApplicable);
        }
        if !relevant_dimensions
            .iter()
            .any(|d| reference.get(*d).is_some())
        {
            warn!(
                "No relevant dimension has a reference value for '{}'; scoring {}",
                culture, NO_COMPARABLE_SCORE
            );
            return Ok(AlignmentScore::Score(NO_COMPARABLE_SCORE));
        }

        let inferred = self.inferencer.infer(response).await?;
        let score = match rms_distance(reference, &inferred, relevant_dimensions) {
            Some(distance) => {
                let s = score_from_distance(distance);
                debug!("Alignment with {}: distance={:.3} score={:.2}", culture, distance, s);
                s
            }
            None => NO_COMPARABLE_SCORE,
        };
        Ok(AlignmentScore::Score(score))
    }

    /// Score against the relevant dimensions of `scenario`.
    pub async fn score_scenario(
        &self,
        response: &StructuredResponse,
        culture: &str,
        scenario: &ScenarioSpec,
    ) -> Result<AlignmentScore> {
        self.score(response, culture, &scenario.relevant_dimensions)
            .await
    }
}
