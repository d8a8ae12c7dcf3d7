use std::collections::HashMap;
use std::io;
use std::path::Path;

use lazy_static::lazy_static;
use serde::Deserialize;

/// The fallback intent labels, used whenever no `label_mapping.json` is
/// available. Order matters: probability distributions are index-aligned
/// to this list.
pub const DEFAULT_INTENTS: [&str; 6] = [
    "feedback",
    "information",
    "problem",
    "question",
    "request",
    "scheduling",
];

lazy_static! {
    static ref EMOJI: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("question", "\u{2753}");
        m.insert("request", "\u{1F64F}");
        m.insert("scheduling", "\u{1F4C5}");
        m.insert("information", "\u{2139}\u{FE0F}");
        m.insert("problem", "\u{26A0}\u{FE0F}");
        m.insert("feedback", "\u{1F4AC}");
        m
    };
    static ref RECOMMENDATIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(
            "question",
            "This email contains a question requiring information. Prepare a response with relevant details.",
        );
        m.insert(
            "request",
            "This email contains a request for action. Determine if you can fulfill this request and provide a timeline.",
        );
        m.insert(
            "scheduling",
            "This email is about scheduling a meeting or event. Check availability and respond with confirmation or alternatives.",
        );
        m.insert(
            "information",
            "This email is sharing information. No immediate action may be required, but you might want to acknowledge receipt.",
        );
        m.insert(
            "problem",
            "This email reports an issue requiring troubleshooting. Escalate to the appropriate technical team.",
        );
        m.insert(
            "feedback",
            "This email contains feedback. Thank the sender and consider if any follow-up actions are needed.",
        );
        m
    };
}

/// Returns the display emoji for an intent label, or an empty string for
/// labels outside the known set.
pub fn emoji_for(label: &str) -> &'static str {
    EMOJI.get(label).copied().unwrap_or("")
}

/// Returns the canned recommendation sentence for an intent label, or an
/// empty string for labels outside the known set.
pub fn recommendation_for(label: &str) -> &'static str {
    RECOMMENDATIONS.get(label).copied().unwrap_or("")
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Label set cannot be empty")]
    Empty,
}

/// On-disk shape of `label_mapping.json`, written by the training pipeline.
#[derive(Debug, Deserialize)]
struct LabelMapping {
    label_names: Vec<String>,
}

/// An ordered, closed set of intent labels.
///
/// Probability distributions produced by the classifier are index-aligned
/// to this ordering, so the order is load-bearing and never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Result<Self, LabelError> {
        if names.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self { names })
    }

    /// The compiled-in default six-intent label set.
    pub fn default_intents() -> Self {
        Self {
            names: DEFAULT_INTENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Loads the label set from a `label_mapping.json` file.
    pub fn from_mapping_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let bytes = std::fs::read(path.as_ref())?;
        let mapping: LabelMapping = serde_json::from_slice(&bytes)?;
        Self::new(mapping.label_names)
    }

    /// Loads the label set from a mapping file, falling back to the default
    /// intents on any failure. The failure is logged, never surfaced.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_mapping_file(path.as_ref()) {
            Ok(labels) => labels,
            Err(e) => {
                log::warn!(
                    "Could not load label mapping from {:?} ({}), using default intents",
                    path.as_ref(),
                    e
                );
                Self::default_intents()
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intents_order() {
        let labels = LabelSet::default_intents();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels.names()[0], "feedback");
        assert_eq!(labels.names()[5], "scheduling");
    }

    #[test]
    fn test_empty_label_set_rejected() {
        assert!(matches!(LabelSet::new(vec![]), Err(LabelError::Empty)));
    }

    #[test]
    fn test_unknown_label_lookups_are_empty() {
        assert_eq!(emoji_for("spam"), "");
        assert_eq!(recommendation_for("spam"), "");
    }

    #[test]
    fn test_known_label_lookups() {
        assert_eq!(emoji_for("question"), "\u{2753}");
        assert!(recommendation_for("problem").contains("troubleshooting"));
    }
}
