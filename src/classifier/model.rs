use std::sync::Arc;

use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::TextEncoding;
use super::error::ClassifierError;
use super::utils::{argmax_first, softmax};
use crate::labels::LabelSet;
use crate::models::ModelCharacteristics;
use crate::triage::IntentScorer;

/// A thread-safe email intent classifier backed by an ONNX
/// sequence-classification model.
///
/// # Thread Safety
///
/// This type is `Send + Sync` because all of its fields are thread-safe:
/// `String`, `LabelSet` and `ModelCharacteristics` are plain data, and the
/// `Tokenizer` and `Session` are wrapped in `Arc`. A single instance can be
/// shared across server handlers without additional locking.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use mailroom::Classifier;
///
/// let classifier = Classifier::builder()
///     .with_model_dir("models/email-intent")?
///     .build()?;
///
/// let (intent, probs) = classifier.predict("SUBJECT: Hi BODY: Quick question")?;
/// println!("Predicted intent: {} ({:.3})", intent, probs[0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub labels: LabelSet,
    pub characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl TextEncoding for Classifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.characteristics.max_sequence_length)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            labels: self.labels.clone(),
            max_sequence_length: self.characteristics.max_sequence_length,
        }
    }

    /// Counts tokens without running the model. Useful for checking how much
    /// of a long email will survive truncation.
    pub fn token_count(&self, text: &str) -> Result<usize, ClassifierError> {
        self.count_tokens(text)
    }

    /// Predicts the intent of the input text.
    ///
    /// # Returns
    /// A tuple containing:
    /// * The predicted intent label (ties resolve to the lowest index)
    /// * The softmax probability distribution, index-aligned to the label set
    pub fn predict(&self, text: &str) -> Result<(String, Vec<f32>), ClassifierError> {
        let probs = self.probabilities(text)?;
        // probabilities() guarantees a non-empty distribution
        let top = argmax_first(&probs).ok_or_else(|| {
            ClassifierError::PredictionError("Model produced an empty distribution".into())
        })?;
        Ok((self.labels.names()[top].clone(), probs))
    }

    /// Runs the model and softmaxes the logits into a probability
    /// distribution aligned to the label set.
    pub fn probabilities(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Input text cannot be empty".into(),
            ));
        }

        let logits = self.class_logits(text)?;
        if logits.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        Ok(softmax(&logits))
    }
}

impl IntentScorer for Classifier {
    fn score(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        self.probabilities(text)
    }
}
