//! Which reference culture do no-persona responses most resemble?

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::dimension::CulturalDimension;
use crate::error::Result;
use crate::extract::StructuredResponse;
use crate::inference::ProfileInferencer;
use crate::profile::CultureRegistry;
use crate::scenario::ScenarioLookup;
use crate::utils::rms;

/// RMS distance from the baseline responses to every comparable culture.
///
/// Each successfully extracted response contributes one observation: its
/// inferred value on the scenario's primary dimension. Responses that failed
/// extraction or name an unknown scenario are skipped. Cultures with no
/// reference value on any observed dimension are omitted from the result.
pub async fn estimate_baseline_bias(
    responses: &[(StructuredResponse, String)],
    scenarios: &dyn ScenarioLookup,
    registry: &CultureRegistry,
    inferencer: &ProfileInferencer,
) -> Result<BTreeMap<String, f64>> {
    let mut observations: Vec<(CulturalDimension, f64)> = Vec::new();
    for (response, scenario_id) in responses {
        if !response.extraction_succeeded() {
            continue;
        }
        let Some(scenario) = scenarios.get_scenario(scenario_id) else {
            warn!("Unknown scenario '{}' in baseline responses; skipped", scenario_id);
            continue;
        };
        let profile = inferencer.infer(response).await?;
        let dim = scenario.primary_dimension;
        observations.push((dim, profile.get(dim)));
    }

    let mut distances = BTreeMap::new();
    if observations.is_empty() {
        return Ok(distances);
    }

    for culture in registry.comparable() {
        let squared: Vec<f64> = observations
            .iter()
            .filter_map(|(dim, value)| culture.reference.get(*dim).map(|r| (r - value).powi(2)))
            .collect();
        if let Some(distance) = rms(&squared) {
            debug!(
                "Baseline distance to {}: {:.3} over {} observations",
                culture.id,
                distance,
                squared.len()
            );
            distances.insert(culture.id.clone(), distance);
        }
    }
    Ok(distances)
}

/// Cultures ordered by ascending distance; ties break by identifier.
pub fn rank_cultures(distances: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = distances
        .iter()
        .map(|(id, d)| (id.clone(), *d))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// The nearest culture, if any.
pub fn closest_culture(distances: &BTreeMap<String, f64>) -> Option<(String, f64)> {
    rank_cultures(distances).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_is_ascending() {
        let distances: BTreeMap<String, f64> = [
            ("US".to_string(), 1.2),
            ("Japan".to_string(), 0.4),
            ("India".to_string(), 0.9),
        ]
        .into();
        let ranked = rank_cultures(&distances);
        assert_eq!(ranked[0].0, "Japan");
        assert_eq!(ranked[2].0, "US");
        assert_eq!(closest_culture(&distances).unwrap().0, "Japan");
        assert!(closest_culture(&BTreeMap::new()).is_none());
    }
}
