//! The report formatter: a pure transformation from a label set and a
//! probability distribution to the markdown triage report.

use std::cmp::Ordering;

use crate::classifier::utils::argmax_first;
use crate::classifier::ClassifierError;
use crate::labels::{emoji_for, recommendation_for, LabelSet};

/// Returned verbatim when the subject or body is blank.
pub const MISSING_INPUT_PROMPT: &str = "Please enter both subject and body text.";

/// Renders the triage report for a probability distribution.
///
/// The distribution must be index-aligned with `labels` and of equal
/// length; a mismatch is rejected rather than silently mis-aligned. The
/// output is fully deterministic: same inputs, byte-identical report.
///
/// Layout, in order:
/// - heading with emoji, uppercased intent and confidence percentage
/// - the canned recommendation for the predicted intent
/// - a probability table sorted by descending probability (stable, so
///   ties keep label order)
pub fn render_report(labels: &LabelSet, probs: &[f32]) -> Result<String, ClassifierError> {
    if labels.len() != probs.len() {
        return Err(ClassifierError::ValidationError(format!(
            "Label/probability length mismatch: {} labels, {} probabilities",
            labels.len(),
            probs.len()
        )));
    }
    let top = argmax_first(probs).ok_or_else(|| {
        ClassifierError::ValidationError("Cannot render a report for zero categories".into())
    })?;

    let intent = &labels.names()[top];
    let confidence = probs[top];

    let mut out = String::new();
    out.push_str(&format!(
        "## Intent: {} {} ({:.1}%)\n\n",
        emoji_for(intent),
        intent.to_uppercase(),
        confidence * 100.0
    ));

    out.push_str(&format!(
        "### Recommended Action\n{}\n\n",
        recommendation_for(intent)
    ));

    out.push_str("### Probability Distribution\n");
    out.push_str("|Intent|Probability|\n|-|-|\n");

    let mut rows: Vec<(&str, f32)> = labels
        .names()
        .iter()
        .map(String::as_str)
        .zip(probs.iter().copied())
        .collect();
    // Vec::sort_by is stable; a descending comparator keeps original label
    // order for equal probabilities.
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    for (label, prob) in rows {
        out.push_str(&format!("|{}|{:.1}%|\n", label, prob * 100.0));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_labels() -> LabelSet {
        LabelSet::new(
            ["question", "request", "scheduling", "information", "problem", "feedback"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_boundary_distribution() {
        let labels = six_labels();
        let report = render_report(&labels, &[0.7, 0.1, 0.1, 0.1, 0.0, 0.0]).unwrap();
        assert!(report.starts_with("## Intent: \u{2753} QUESTION (70.0%)\n\n"));
        let first_row = report
            .lines()
            .find(|l| l.starts_with('|') && !l.starts_with("|Intent") && !l.starts_with("|-"))
            .unwrap();
        assert_eq!(first_row, "|question|70.0%|");
    }

    #[test]
    fn test_tie_resolves_to_lowest_index() {
        let labels = six_labels();
        let report = render_report(&labels, &[0.3, 0.3, 0.1, 0.1, 0.1, 0.1]).unwrap();
        assert!(report.contains("QUESTION"));
        assert!(!report.contains("## Intent: \u{1F64F} REQUEST"));
    }

    #[test]
    fn test_rows_sorted_descending() {
        let labels = six_labels();
        let report = render_report(&labels, &[0.05, 0.2, 0.4, 0.1, 0.15, 0.1]).unwrap();
        let percentages: Vec<f32> = report
            .lines()
            .filter(|l| l.starts_with('|') && !l.starts_with("|Intent") && !l.starts_with("|-"))
            .map(|l| {
                l.trim_matches('|')
                    .rsplit('|')
                    .next()
                    .unwrap()
                    .trim_end_matches('%')
                    .parse::<f32>()
                    .unwrap()
            })
            .collect();
        assert_eq!(percentages.len(), 6);
        for pair in percentages.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_unknown_label_renders_empty() {
        let labels =
            LabelSet::new(vec!["spam".to_string(), "question".to_string()]).unwrap();
        let report = render_report(&labels, &[0.9, 0.1]).unwrap();
        // No emoji between "Intent:" and the name, and an empty
        // recommendation body.
        assert!(report.starts_with("## Intent:  SPAM (90.0%)\n\n"));
        assert!(report.contains("### Recommended Action\n\n\n"));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let labels = six_labels();
        let result = render_report(&labels, &[0.5, 0.5]);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_idempotent() {
        let labels = six_labels();
        let probs = [0.12, 0.08, 0.3, 0.25, 0.15, 0.1];
        let a = render_report(&labels, &probs).unwrap();
        let b = render_report(&labels, &probs).unwrap();
        assert_eq!(a, b);
    }
}
