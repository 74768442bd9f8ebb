//! Structured representation of a model response.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The choice a respondent made, normalized onto a small closed vocabulary.
///
/// `Unrecognized` keeps the literal text of a decision line that matched the
/// marker but none of the synonym lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Decision {
    OptionA,
    OptionB,
    Compromise,
    Decline,
    Unrecognized(String),
}

impl Decision {
    pub fn label(&self) -> &str {
        match self {
            Decision::OptionA => "Option A",
            Decision::OptionB => "Option B",
            Decision::Compromise => "Compromise",
            Decision::Decline => "Decline",
            Decision::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Decision::Unrecognized(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Decision {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Option A" => Decision::OptionA,
            "Option B" => Decision::OptionB,
            "Compromise" => Decision::Compromise,
            "Decline" => Decision::Decline,
            _ => Decision::Unrecognized(label),
        }
    }
}

impl From<Decision> for String {
    fn from(decision: Decision) -> Self {
        decision.label().to_string()
    }
}

/// Result of running the extractor over one raw model response.
///
/// Built once by [`crate::extract::extract`] (or [`StructuredResponse::new`])
/// and read-only afterwards. `extraction_succeeded` is derived, never set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResponseRecord", into = "ResponseRecord")]
pub struct StructuredResponse {
    raw_text: String,
    explanation: String,
    decision: Option<Decision>,
    selected_values: Vec<String>,
    extraction_errors: Vec<String>,
}

/// Maximum number of values kept from a response.
pub const MAX_SELECTED_VALUES: usize = 3;

impl StructuredResponse {
    /// Assemble a response from already-extracted parts.
    ///
    /// Values beyond [`MAX_SELECTED_VALUES`] are dropped. When the parts do
    /// not satisfy the success invariant and no diagnostic was supplied, a
    /// generic one is added so `extraction_errors` is never empty on failure.
    pub fn new(
        raw_text: impl Into<String>,
        explanation: impl Into<String>,
        decision: Option<Decision>,
        mut selected_values: Vec<String>,
        mut extraction_errors: Vec<String>,
    ) -> Self {
        selected_values.truncate(MAX_SELECTED_VALUES);
        let succeeded = decision.is_some() && !selected_values.is_empty();
        if succeeded {
            extraction_errors.clear();
        } else if extraction_errors.is_empty() {
            if decision.is_none() {
                extraction_errors.push("missing decision".to_string());
            }
            if selected_values.is_empty() {
                extraction_errors.push("missing values".to_string());
            }
        }
        Self {
            raw_text: raw_text.into(),
            explanation: explanation.into(),
            decision,
            selected_values,
            extraction_errors,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    pub fn selected_values(&self) -> &[String] {
        &self.selected_values
    }

    pub fn extraction_succeeded(&self) -> bool {
        self.decision.is_some() && !self.selected_values.is_empty()
    }

    pub fn extraction_errors(&self) -> &[String] {
        &self.extraction_errors
    }

    /// Text handed to the embedding collaborator: explanation, decision label
    /// and values, space separated. May be all whitespace.
    pub fn semantic_blob(&self) -> String {
        let decision = self.decision.as_ref().map(Decision::label).unwrap_or("");
        format!(
            "{} {} {}",
            self.explanation,
            decision,
            self.selected_values.join(" ")
        )
    }
}

/// Flat wire shape used for JSON output and input.
#[derive(Serialize, Deserialize)]
struct ResponseRecord {
    raw_text: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    decision: Option<Decision>,
    #[serde(default)]
    selected_values: Vec<String>,
    #[serde(default)]
    extraction_succeeded: bool,
    #[serde(default)]
    extraction_errors: Vec<String>,
}

impl From<ResponseRecord> for StructuredResponse {
    fn from(r: ResponseRecord) -> Self {
        StructuredResponse::new(
            r.raw_text,
            r.explanation,
            r.decision,
            r.selected_values,
            r.extraction_errors,
        )
    }
}

impl From<StructuredResponse> for ResponseRecord {
    fn from(r: StructuredResponse) -> Self {
        let extraction_succeeded = r.extraction_succeeded();
        ResponseRecord {
            raw_text: r.raw_text,
            explanation: r.explanation,
            decision: r.decision,
            selected_values: r.selected_values,
            extraction_succeeded,
            extraction_errors: r.extraction_errors,
        }
    }
}
