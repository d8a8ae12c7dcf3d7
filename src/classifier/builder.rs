use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::TextEncoding;
use super::error::ClassifierError;
use super::model::Classifier;
use crate::labels::LabelSet;
use crate::models::{
    ModelCharacteristics, DEFAULT_MAX_SEQUENCE_LENGTH, LABEL_MAPPING_FILE, MODEL_FILE,
    TOKENIZER_FILE,
};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    labels: Option<LabelSet>,
    max_sequence_length: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl TextEncoding for ClassifierBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_sequence_length.unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH))
    }
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the intent labels. Without this the labels come from the
    /// model directory's `label_mapping.json` (or the compiled-in default).
    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Points the builder at a model directory containing `model.onnx`,
    /// `tokenizer.json` and optionally `label_mapping.json`.
    ///
    /// # Errors
    /// Fails if the model or tokenizer file is missing or cannot be loaded,
    /// or if paths were already set. A missing label mapping is not an
    /// error; the default intents are used instead.
    pub fn with_model_dir<P: AsRef<Path>>(self, dir: P) -> Result<Self, ClassifierError> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let labels = LabelSet::load_or_default(dir.join(LABEL_MAPPING_FILE));

        let mut builder = self.with_files(
            &model_path.to_string_lossy(),
            &tokenizer_path.to_string_lossy(),
            None,
        )?;
        if builder.labels.is_none() {
            builder.labels = Some(labels);
        }
        Ok(builder)
    }

    /// Sets explicit model and tokenizer paths.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX sequence-classification model
    /// * `tokenizer_path` - Path to the tokenizer file
    /// * `max_sequence_length` - Optional truncation limit; defaults to 256
    ///   tokens, the limit the intent model was exported with.
    pub fn with_files(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if !Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Tokenizer file not found: {}",
                tokenizer_path
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        // Create session using the singleton environment
        let session = create_session_builder(&self.runtime_config)?.commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.max_sequence_length = max_sequence_length.or(Some(DEFAULT_MAX_SEQUENCE_LENGTH));
        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final Classifier instance.
    ///
    /// Runs a probe input through the model to check that the
    /// classification head produces exactly one logit per label.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        if self.model_path.is_none() || self.tokenizer_path.is_none() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths must be set".to_string(),
            ));
        }

        let labels = self.labels.take().unwrap_or_else(LabelSet::default_intents);
        let max_sequence_length = self
            .max_sequence_length
            .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);

        // Probe the classification head before committing to the label set.
        let probe = self.class_logits("probe input")?;
        if probe.len() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "Model produces {} logits but {} labels are configured",
                probe.len(),
                labels.len()
            )));
        }
        info!("Classification head verified: {} labels", labels.len());

        let tokenizer = Arc::new(
            self.tokenizer
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?,
        );
        let session = Arc::new(
            self.session
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?,
        );

        let num_labels = labels.len();
        Ok(Classifier {
            model_path: self.model_path.take().unwrap_or_default(),
            tokenizer_path: self.tokenizer_path.take().unwrap_or_default(),
            tokenizer,
            session,
            labels,
            characteristics: ModelCharacteristics {
                max_sequence_length,
                num_labels,
            },
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class logits".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_paths_rejected() {
        let result = ClassifierBuilder::new().with_files("", "tokenizer.json", None);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));

        let result = ClassifierBuilder::new().with_files("model.onnx", "", None);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_files_rejected() {
        let result = ClassifierBuilder::new().with_files(
            "/nonexistent/model.onnx",
            "/nonexistent/tokenizer.json",
            None,
        );
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_build_without_model_rejected() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }
}
