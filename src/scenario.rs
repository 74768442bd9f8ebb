//! Scenario lookup: relevant and primary dimensions per scenario id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::dimension::CulturalDimension;
use crate::error::{LensError, Result};

const BUILTIN_SCENARIOS: &str = include_str!("../data/scenarios.toml");

/// What the scoring core needs to know about a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub relevant_dimensions: BTreeSet<CulturalDimension>,
    pub primary_dimension: CulturalDimension,
}

/// Read-only scenario lookup by identifier.
pub trait ScenarioLookup: Send + Sync {
    fn get_scenario(&self, id: &str) -> Option<&ScenarioSpec>;
}

#[derive(Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenario: Vec<ScenarioSpec>,
}

/// Counts over a catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_primary_dimension: BTreeMap<CulturalDimension, usize>,
}

/// In-memory catalog of scenario specs.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, ScenarioSpec>,
}

impl ScenarioCatalog {
    /// The bundled thirty-scenario catalog.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_SCENARIOS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LensError::dataset("scenarios", format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ScenarioFile = toml::from_str(content)
            .map_err(|e| LensError::dataset("scenarios", e.to_string()))?;
        Self::from_specs(file.scenario)
    }

    /// Build from specs, rejecting duplicate ids. A primary dimension missing
    /// from the relevant set is added to it.
    pub fn from_specs(specs: impl IntoIterator<Item = ScenarioSpec>) -> Result<Self> {
        let mut scenarios = BTreeMap::new();
        for mut spec in specs {
            spec.relevant_dimensions.insert(spec.primary_dimension);
            let id = spec.id.clone();
            if scenarios.insert(id.clone(), spec).is_some() {
                return Err(LensError::dataset(
                    "scenarios",
                    format!("duplicate scenario id '{}'", id),
                ));
            }
        }
        Ok(Self { scenarios })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn by_primary_dimension(&self, dim: CulturalDimension) -> Vec<&ScenarioSpec> {
        self.scenarios
            .values()
            .filter(|s| s.primary_dimension == dim)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&ScenarioSpec> {
        self.scenarios
            .values()
            .filter(|s| s.category == category)
            .collect()
    }

    pub fn stats(&self) -> ScenarioStats {
        let mut by_category = BTreeMap::new();
        let mut by_primary_dimension = BTreeMap::new();
        for s in self.scenarios.values() {
            *by_category.entry(s.category.clone()).or_insert(0) += 1;
            *by_primary_dimension.entry(s.primary_dimension).or_insert(0) += 1;
        }
        ScenarioStats {
            total: self.scenarios.len(),
            by_category,
            by_primary_dimension,
        }
    }

    /// True when every dimension is the primary dimension of the same number
    /// of scenarios (and that number is non-zero).
    pub fn is_balanced(&self) -> bool {
        let stats = self.stats();
        let counts: Vec<usize> = CulturalDimension::ALL
            .iter()
            .map(|d| stats.by_primary_dimension.get(d).copied().unwrap_or(0))
            .collect();
        counts[0] > 0 && counts.iter().all(|c| *c == counts[0])
    }
}

impl ScenarioLookup for ScenarioCatalog {
    fn get_scenario(&self, id: &str) -> Option<&ScenarioSpec> {
        self.scenarios.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_balanced() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 30);
        assert!(catalog.is_balanced());
        assert_eq!(
            catalog
                .by_primary_dimension(CulturalDimension::Indulgence)
                .len(),
            5
        );
    }

    #[test]
    fn lookup_returns_primary_and_relevant() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let s = catalog.get_scenario("PDI001").unwrap();
        assert_eq!(s.primary_dimension, CulturalDimension::PowerDistance);
        assert!(s.relevant_dimensions.contains(&CulturalDimension::Individualism));
        assert!(catalog.get_scenario("NOPE").is_none());
    }

    #[test]
    fn primary_is_always_relevant() {
        let catalog = ScenarioCatalog::from_toml_str(
            "[[scenario]]\nid = \"S1\"\nrelevant_dimensions = []\nprimary_dimension = \"indulgence\"\n",
        )
        .unwrap();
        let s = catalog.get_scenario("S1").unwrap();
        assert!(s.relevant_dimensions.contains(&CulturalDimension::Indulgence));
        assert!(!catalog.is_balanced());
    }

    #[test]
    fn unknown_dimension_is_a_dataset_error() {
        let err = ScenarioCatalog::from_toml_str(
            "[[scenario]]\nid = \"S1\"\nrelevant_dimensions = [\"harmony\"]\nprimary_dimension = \"indulgence\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, LensError::Dataset { .. }));
    }
}
