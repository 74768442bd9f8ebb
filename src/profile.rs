//! Cultural profiles and the registry of reference cultures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::dimension::{CulturalDimension, SCALE_MAX, SCALE_MIN};
use crate::error::{LensError, Result};

/// Reserved identifier of the no-persona pseudo-culture.
pub const BASELINE_CULTURE: &str = "baseline";

const BUILTIN_CULTURES: &str = include_str!("../data/cultures.toml");

pub fn is_baseline(culture: &str) -> bool {
    culture.trim().eq_ignore_ascii_case(BASELINE_CULTURE)
}

/// A value on every dimension, each within [-2.0, 2.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CulturalProfile {
    scores: [f64; 6],
}

impl Default for CulturalProfile {
    fn default() -> Self {
        Self::neutral()
    }
}

impl CulturalProfile {
    /// All-zero profile.
    pub fn neutral() -> Self {
        Self { scores: [0.0; 6] }
    }

    /// Build from explicit values; each is clamped onto the scale.
    pub fn from_fn(mut f: impl FnMut(CulturalDimension) -> f64) -> Self {
        let mut profile = Self::neutral();
        for dim in CulturalDimension::ALL {
            profile.set(dim, f(dim));
        }
        profile
    }

    pub fn get(&self, dim: CulturalDimension) -> f64 {
        self.scores[dim.index()]
    }

    pub(crate) fn set(&mut self, dim: CulturalDimension, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value };
        self.scores[dim.index()] = value.clamp(SCALE_MIN, SCALE_MAX);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CulturalDimension, f64)> + '_ {
        CulturalDimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    pub fn is_neutral(&self) -> bool {
        self.scores.iter().all(|v| *v == 0.0)
    }
}

impl Serialize for CulturalProfile {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let map: BTreeMap<CulturalDimension, f64> = self.iter().collect();
        map.serialize(serializer)
    }
}

/// Expected coordinates of a culture. `None` marks a dimension the culture
/// deliberately carries no ground truth for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReferenceProfile {
    scores: [Option<f64>; 6],
}

impl ReferenceProfile {
    /// Profile with every dimension undefined.
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (CulturalDimension, f64)>) -> Self {
        let mut profile = Self::undefined();
        for (dim, value) in pairs {
            profile.scores[dim.index()] = Some(value);
        }
        profile
    }

    pub fn get(&self, dim: CulturalDimension) -> Option<f64> {
        self.scores[dim.index()]
    }

    /// True when no dimension has a value (the baseline convention).
    pub fn is_undefined(&self) -> bool {
        self.scores.iter().all(Option::is_none)
    }

    pub fn defined(&self) -> impl Iterator<Item = (CulturalDimension, f64)> + '_ {
        CulturalDimension::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|v| (d, v)))
    }
}

/// A named culture with its persona details and reference profile.
#[derive(Debug, Clone)]
pub struct CultureContext {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub reference: ReferenceProfile,
    /// Published 0-100 index values, when known.
    pub raw_index: BTreeMap<CulturalDimension, f64>,
}

#[derive(Deserialize)]
struct CultureFile {
    #[serde(default)]
    culture: Vec<CultureRecord>,
}

#[derive(Deserialize)]
struct CultureRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    scores: BTreeMap<CulturalDimension, f64>,
    #[serde(default)]
    raw_index: BTreeMap<CulturalDimension, f64>,
}

/// Map a 0-100 index value onto the -2.0..2.0 scale.
///
/// Buckets: below 20 → -2.0, below 35 → -1.5, below 45 → -1.0, below 55 → 0.0,
/// below 65 → 1.0, below 80 → 1.5, otherwise 2.0.
pub fn hofstede_to_scale(raw: f64) -> f64 {
    match raw {
        r if r < 20.0 => -2.0,
        r if r < 35.0 => -1.5,
        r if r < 45.0 => -1.0,
        r if r < 55.0 => 0.0,
        r if r < 65.0 => 1.0,
        r if r < 80.0 => 1.5,
        _ => 2.0,
    }
}

/// A configured score that disagrees with the bucketed raw index value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleMismatch {
    pub culture: String,
    pub dimension: CulturalDimension,
    pub raw: f64,
    pub expected: f64,
    pub configured: Option<f64>,
}

/// Read-only set of reference cultures, keyed by identifier.
///
/// Constructed once (from the bundled dataset or a file) and shared.
#[derive(Debug, Clone)]
pub struct CultureRegistry {
    cultures: BTreeMap<String, CultureContext>,
}

impl CultureRegistry {
    /// The bundled dataset.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CULTURES)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LensError::dataset("cultures", format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CultureFile = toml::from_str(content)
            .map_err(|e| LensError::dataset("cultures", e.to_string()))?;
        let mut cultures = BTreeMap::new();
        for record in file.culture {
            for (dim, value) in &record.scores {
                if !(SCALE_MIN..=SCALE_MAX).contains(value) {
                    return Err(LensError::dataset(
                        "cultures",
                        format!(
                            "{} score for {} is {} (outside {}..{})",
                            dim, record.id, value, SCALE_MIN, SCALE_MAX
                        ),
                    ));
                }
            }
            if is_baseline(&record.id) && !record.scores.is_empty() {
                tracing::warn!("Baseline culture defines scores; they are never used for alignment");
            }
            let ctx = CultureContext {
                name: record.name.unwrap_or_else(|| record.id.clone()),
                location: record.location,
                description: record.description,
                reference: ReferenceProfile::from_pairs(record.scores),
                raw_index: record.raw_index,
                id: record.id.clone(),
            };
            if cultures.insert(record.id.clone(), ctx).is_some() {
                return Err(LensError::dataset(
                    "cultures",
                    format!("duplicate culture id '{}'", record.id),
                ));
            }
        }
        Ok(Self { cultures })
    }

    pub fn from_contexts(contexts: impl IntoIterator<Item = CultureContext>) -> Self {
        Self {
            cultures: contexts.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn get(&self, culture: &str) -> Option<&CultureContext> {
        self.cultures.get(culture)
    }

    pub fn reference(&self, culture: &str) -> Option<&ReferenceProfile> {
        self.get(culture).map(|c| &c.reference)
    }

    pub fn contains(&self, culture: &str) -> bool {
        self.cultures.contains_key(culture)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cultures.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CultureContext> {
        self.cultures.values()
    }

    pub fn len(&self) -> usize {
        self.cultures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cultures.is_empty()
    }

    /// Cultures that carry at least one reference value, baseline excluded.
    pub fn comparable(&self) -> impl Iterator<Item = &CultureContext> {
        self.iter()
            .filter(|c| !is_baseline(&c.id) && !c.reference.is_undefined())
    }

    /// Compare configured scores with the bucketed raw index values.
    pub fn validate_against_raw(&self) -> Vec<ScaleMismatch> {
        let mut mismatches = Vec::new();
        for ctx in self.iter() {
            for (dim, raw) in &ctx.raw_index {
                let expected = hofstede_to_scale(*raw);
                let configured = ctx.reference.get(*dim);
                if configured != Some(expected) {
                    mismatches.push(ScaleMismatch {
                        culture: ctx.id.clone(),
                        dimension: *dim,
                        raw: *raw,
                        expected,
                        configured,
                    });
                }
            }
        }
        mismatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_dataset_loads_with_baseline() {
        let reg = CultureRegistry::builtin().unwrap();
        assert_eq!(reg.len(), 6);
        assert!(reg.reference(BASELINE_CULTURE).unwrap().is_undefined());
        assert_eq!(
            reg.reference("US").unwrap().get(CulturalDimension::Individualism),
            Some(2.0)
        );
        assert_eq!(reg.comparable().count(), 5);
    }

    #[test]
    fn builtin_scores_match_raw_index() {
        let reg = CultureRegistry::builtin().unwrap();
        assert!(reg.validate_against_raw().is_empty());
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(hofstede_to_scale(0.0), -2.0);
        assert_eq!(hofstede_to_scale(20.0), -1.5);
        assert_eq!(hofstede_to_scale(44.9), -1.0);
        assert_eq!(hofstede_to_scale(45.0), 0.0);
        assert_eq!(hofstede_to_scale(64.0), 1.0);
        assert_eq!(hofstede_to_scale(79.0), 1.5);
        assert_eq!(hofstede_to_scale(100.0), 2.0);
    }

    #[test]
    fn mismatch_is_reported() {
        let reg = CultureRegistry::from_toml_str(
            r#"
            [[culture]]
            id = "X"
            [culture.scores]
            individualism = 1.0
            [culture.raw_index]
            individualism = 91
            power_distance = 10
            "#,
        )
        .unwrap();
        let mismatches = reg.validate_against_raw();
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches.iter().any(|m| m.dimension == CulturalDimension::PowerDistance
            && m.configured.is_none()));
    }

    #[test]
    fn out_of_scale_scores_are_rejected() {
        let err = CultureRegistry::from_toml_str(
            "[[culture]]\nid = \"X\"\n[culture.scores]\nindulgence = 3.5\n",
        )
        .unwrap_err();
        assert!(matches!(err, LensError::Dataset { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err =
            CultureRegistry::from_toml_str("[[culture]]\nid = \"X\"\n[[culture]]\nid = \"X\"\n")
                .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn profile_values_are_clamped() {
        let p = CulturalProfile::from_fn(|d| match d {
            CulturalDimension::Individualism => 5.0,
            CulturalDimension::Indulgence => f64::NAN,
            _ => -9.0,
        });
        assert_eq!(p.get(CulturalDimension::Individualism), 2.0);
        assert_eq!(p.get(CulturalDimension::Indulgence), 0.0);
        assert_eq!(p.get(CulturalDimension::Masculinity), -2.0);
    }

    #[test]
    fn baseline_id_is_case_insensitive() {
        assert!(is_baseline("Baseline"));
        assert!(!is_baseline("US"));
    }
}
