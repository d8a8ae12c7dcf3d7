use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::classifier::utils::argmax_first;
use crate::classifier::ClassifierError;
use crate::labels::LabelSet;
use crate::report::{render_report, MISSING_INPUT_PROMPT};

/// Anything that can turn text into a probability distribution over the
/// intent labels. The production implementation is [`crate::Classifier`];
/// tests substitute stubs so the pipeline runs without model files.
pub trait IntentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;
}

/// Composes the single classifier input from the two email fields, the
/// same way the model was trained.
pub fn compose_input(subject: &str, body: &str) -> String {
    format!("SUBJECT: {} BODY: {}", subject, body)
}

/// The predicted intent, its confidence and the full score map.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub intent: String,
    pub confidence: f32,
    pub scores: HashMap<String, f32>,
}

/// Result of one triage call: the rendered report, plus the structured
/// prediction when the classifier actually ran.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub report: String,
    pub prediction: Option<Prediction>,
}

/// The triage pipeline: validate input, score, format.
///
/// Stateless per call; a single instance is shared across concurrent
/// server handlers.
pub struct Triage {
    scorer: Arc<dyn IntentScorer>,
    labels: LabelSet,
}

impl Triage {
    pub fn new(scorer: Arc<dyn IntentScorer>, labels: LabelSet) -> Self {
        Self { scorer, labels }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Runs the full pipeline for one subject/body pair.
    ///
    /// A blank (empty or whitespace-only) subject or body short-circuits
    /// to the fixed prompt message without invoking the scorer. This is
    /// the only branch in the pipeline.
    pub fn analyze(&self, subject: &str, body: &str) -> Result<TriageOutcome, ClassifierError> {
        if subject.trim().is_empty() || body.trim().is_empty() {
            return Ok(TriageOutcome {
                report: MISSING_INPUT_PROMPT.to_string(),
                prediction: None,
            });
        }

        let text = compose_input(subject, body);
        let probs = self.scorer.score(&text)?;
        let report = render_report(&self.labels, &probs)?;

        // render_report has already rejected empty/mismatched distributions
        let top = argmax_first(&probs).ok_or_else(|| {
            ClassifierError::PredictionError("Scorer produced an empty distribution".into())
        })?;
        let scores = self
            .labels
            .names()
            .iter()
            .cloned()
            .zip(probs.iter().copied())
            .collect();

        Ok(TriageOutcome {
            report,
            prediction: Some(Prediction {
                intent: self.labels.names()[top].clone(),
                confidence: probs[top],
                scores,
            }),
        })
    }
}
