//! Response structure extraction: raw model text to [`StructuredResponse`].
//!
//! Extraction never fails. Missing sections are reported through
//! `extraction_errors` and the derived `extraction_succeeded` flag, so
//! adversarial or sloppy model output always degrades to a defined record.

pub mod grammar;
pub mod response;
pub mod stats;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

pub use grammar::{ValueListGrammar, default_grammars};
pub use response::{Decision, MAX_SELECTED_VALUES, StructuredResponse};
pub use stats::{decision_distribution, extract_batch, parse_success_rate, value_frequency};

static DECISION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DECISION\s*:").expect("decision marker regex"));
static VALUES_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TOP[_ ]VALUES\s*:").expect("values marker regex"));
static EXPLANATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)EXPLANATION\s*:").expect("explanation marker regex"));
static SECTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s*_#]*(DECISION|EXPLANATION|TOP[_ ]VALUES)\s*:").expect("section start regex")
});
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static DEFAULT_EXTRACTOR: Lazy<ResponseExtractor> = Lazy::new(ResponseExtractor::new);

pub const ERR_MISSING_DECISION: &str = "missing decision marker";
pub const ERR_EMPTY_DECISION: &str = "empty decision after marker";
pub const ERR_MISSING_VALUES: &str = "missing values marker";
pub const ERR_NO_VALUES: &str = "no values parsed after marker";

/// Explicit option labels. Checked before the thematic synonyms so that
/// "Option B - sacrifice my personal goals" stays Option B.
static EXPLICIT_LABELS: [(&str, Decision); 2] =
    [("option a", Decision::OptionA), ("option b", Decision::OptionB)];

static SYNONYMS: [(&[&str], Decision); 4] = [
    (
        &["option a", "prioritize personal", "personal goal", "freedom"],
        Decision::OptionA,
    ),
    (
        &["option b", "prioritize family", "family harmony", "group"],
        Decision::OptionB,
    ),
    (&["compromise", "middle ground"], Decision::Compromise),
    (&["decline", "neither"], Decision::Decline),
];

/// Parse `raw_text` with the default grammar chain.
pub fn extract(raw_text: &str) -> StructuredResponse {
    DEFAULT_EXTRACTOR.extract(raw_text)
}

/// Extractor with a configurable, ordered chain of value-list grammars.
pub struct ResponseExtractor {
    grammars: Vec<Box<dyn ValueListGrammar>>,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseExtractor {
    pub fn new() -> Self {
        Self::with_grammars(default_grammars())
    }

    pub fn with_grammars(grammars: Vec<Box<dyn ValueListGrammar>>) -> Self {
        Self { grammars }
    }

    pub fn extract(&self, raw_text: &str) -> StructuredResponse {
        // Fold full-width punctuation and other compatibility forms before matching.
        let text: String = raw_text.nfkc().collect();
        let mut errors = Vec::new();

        let decision = match decision_line(&text) {
            None => {
                errors.push(ERR_MISSING_DECISION.to_string());
                None
            }
            Some(line) if line.is_empty() => {
                errors.push(ERR_EMPTY_DECISION.to_string());
                None
            }
            Some(line) => Some(normalize_decision(line)),
        };

        let selected_values = match values_section(&text) {
            None => {
                errors.push(ERR_MISSING_VALUES.to_string());
                Vec::new()
            }
            Some(section) => match grammar::parse_values(&section, &self.grammars) {
                Some((name, items)) => {
                    debug!("Parsed {} values with {} grammar", items.len(), name);
                    items
                }
                None => {
                    errors.push(ERR_NO_VALUES.to_string());
                    Vec::new()
                }
            },
        };

        let explanation = explanation_text(&text);

        StructuredResponse::new(raw_text, explanation, decision, selected_values, errors)
    }
}

/// Skip the closing emphasis of a bolded marker (`**DECISION:**`) and the
/// whitespace after it.
fn after_marker(text: &str) -> &str {
    text.trim_start_matches('*').trim_start()
}

/// Text after the decision marker up to end of line. Whitespace (including
/// newlines) directly after the marker is skipped, but a following section
/// marker is never taken as the decision.
fn decision_line(text: &str) -> Option<&str> {
    let m = DECISION_MARKER.find(text)?;
    let rest = after_marker(&text[m.end()..]);
    let line = rest.split('\n').next().unwrap_or("");
    if SECTION_START.is_match(line) {
        return Some("");
    }
    Some(line.trim())
}

/// Map a decision line onto the closed vocabulary, or keep it verbatim.
pub fn normalize_decision(line: &str) -> Decision {
    let lower = line.to_lowercase();
    if let Some((_, d)) = EXPLICIT_LABELS
        .iter()
        .find(|(label, _)| lower.contains(label))
    {
        return d.clone();
    }
    SYNONYMS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, d)| d.clone())
        .unwrap_or_else(|| Decision::Unrecognized(line.trim().to_string()))
}

/// Lines after the values marker up to a blank line, another section marker,
/// or end of text.
fn values_section(text: &str) -> Option<String> {
    let m = VALUES_MARKER.find(text)?;
    let rest = after_marker(&text[m.end()..]);
    let lines: Vec<&str> = rest
        .lines()
        .take_while(|line| !line.trim().is_empty() && !SECTION_START.is_match(line))
        .collect();
    Some(lines.join("\n"))
}

fn explanation_text(text: &str) -> String {
    match EXPLANATION_MARKER.find(text) {
        Some(m) => WHITESPACE_RUN
            .replace_all(after_marker(&text[m.end()..]), " ")
            .trim()
            .to_string(),
        None => String::new(),
    }
}
