//! Batch helpers and summary statistics over extracted responses.

use std::collections::BTreeMap;

use super::StructuredResponse;

/// Extract every response in `raw_texts` with the default grammar chain.
pub fn extract_batch<S: AsRef<str>>(raw_texts: &[S]) -> Vec<StructuredResponse> {
    raw_texts.iter().map(|t| super::extract(t.as_ref())).collect()
}

/// Fraction of responses whose extraction succeeded; 0.0 for no responses.
pub fn parse_success_rate(responses: &[StructuredResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let ok = responses.iter().filter(|r| r.extraction_succeeded()).count();
    ok as f64 / responses.len() as f64
}

/// Count of each decision label; responses without a decision are not counted.
pub fn decision_distribution(responses: &[StructuredResponse]) -> BTreeMap<String, usize> {
    let mut dist = BTreeMap::new();
    for d in responses.iter().filter_map(|r| r.decision()) {
        *dist.entry(d.label().to_string()).or_insert(0) += 1;
    }
    dist
}

/// How often each value label was selected across responses.
pub fn value_frequency(responses: &[StructuredResponse]) -> BTreeMap<String, usize> {
    let mut freq = BTreeMap::new();
    for v in responses.iter().flat_map(|r| r.selected_values()) {
        *freq.entry(v.clone()).or_insert(0) += 1;
    }
    freq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_over_mixed_batch() {
        let batch = extract_batch(&[
            "DECISION: Option A\nTOP_VALUES: Personal Autonomy, Self-Determination",
            "DECISION: Option A\nTOP_VALUES: Personal Autonomy",
            "DECISION: Decline",
            "no structure at all",
        ]);
        assert_eq!(parse_success_rate(&batch), 0.5);

        let dist = decision_distribution(&batch);
        assert_eq!(dist.get("Option A"), Some(&2));
        assert_eq!(dist.get("Decline"), Some(&1));
        assert_eq!(dist.values().sum::<usize>(), 3);

        let freq = value_frequency(&batch);
        assert_eq!(freq.get("Personal Autonomy"), Some(&2));
        assert_eq!(freq.get("Self-Determination"), Some(&1));
    }

    #[test]
    fn empty_batch_rate_is_zero() {
        assert_eq!(parse_success_rate(&[]), 0.0);
        assert!(decision_distribution(&[]).is_empty());
    }
}
