//! The closed set of cultural dimensions profiles are expressed over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LensError;

/// Lower bound of every dimension's scale.
pub const SCALE_MIN: f64 = -2.0;
/// Upper bound of every dimension's scale.
pub const SCALE_MAX: f64 = 2.0;

/// One axis of the six-dimension model of cross-cultural value variation.
///
/// Negative values lean toward the low pole (e.g. collectivism for
/// `Individualism`), positive values toward the high pole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalDimension {
    Individualism,
    PowerDistance,
    Masculinity,
    UncertaintyAvoidance,
    LongTermOrientation,
    Indulgence,
}

impl CulturalDimension {
    pub const ALL: [CulturalDimension; 6] = [
        CulturalDimension::Individualism,
        CulturalDimension::PowerDistance,
        CulturalDimension::Masculinity,
        CulturalDimension::UncertaintyAvoidance,
        CulturalDimension::LongTermOrientation,
        CulturalDimension::Indulgence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CulturalDimension::Individualism => "individualism",
            CulturalDimension::PowerDistance => "power_distance",
            CulturalDimension::Masculinity => "masculinity",
            CulturalDimension::UncertaintyAvoidance => "uncertainty_avoidance",
            CulturalDimension::LongTermOrientation => "long_term_orientation",
            CulturalDimension::Indulgence => "indulgence",
        }
    }

    /// Three-letter index abbreviation used by published score tables.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            CulturalDimension::Individualism => "IDV",
            CulturalDimension::PowerDistance => "PDI",
            CulturalDimension::Masculinity => "MAS",
            CulturalDimension::UncertaintyAvoidance => "UAI",
            CulturalDimension::LongTermOrientation => "LTO",
            CulturalDimension::Indulgence => "IND",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CulturalDimension::Individualism => {
                "Degree to which individuals prioritize self over group (high = individualistic, low = collectivistic)"
            }
            CulturalDimension::PowerDistance => {
                "Extent to which less powerful members accept unequal power distribution"
            }
            CulturalDimension::Masculinity => {
                "Preference for achievement and assertiveness vs. caring and quality of life"
            }
            CulturalDimension::UncertaintyAvoidance => {
                "Degree to which people feel threatened by ambiguity and uncertainty"
            }
            CulturalDimension::LongTermOrientation => {
                "Focus on future rewards vs. respect for tradition and the past"
            }
            CulturalDimension::Indulgence => {
                "Extent to which people try to control desires and impulses"
            }
        }
    }

    /// Position in `ALL`, used for fixed-size storage.
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CulturalDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CulturalDimension {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        CulturalDimension::ALL
            .into_iter()
            .find(|d| d.as_str() == key || d.abbreviation().eq_ignore_ascii_case(&key))
            .ok_or_else(|| LensError::Validation {
                message: format!("unknown cultural dimension '{}'", s),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_abbreviations() {
        assert_eq!(
            "power_distance".parse::<CulturalDimension>().unwrap(),
            CulturalDimension::PowerDistance
        );
        assert_eq!(
            "Long-Term Orientation".parse::<CulturalDimension>().unwrap(),
            CulturalDimension::LongTermOrientation
        );
        assert_eq!(
            "uai".parse::<CulturalDimension>().unwrap(),
            CulturalDimension::UncertaintyAvoidance
        );
        assert!("harmony".parse::<CulturalDimension>().is_err());
    }

    #[test]
    fn index_follows_declaration_order() {
        for (i, dim) in CulturalDimension::ALL.iter().enumerate() {
            assert_eq!(dim.index(), i);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&CulturalDimension::LongTermOrientation).unwrap();
        assert_eq!(json, "\"long_term_orientation\"");
    }
}
