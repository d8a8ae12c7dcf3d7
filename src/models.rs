use serde::{Deserialize, Serialize};

/// Canonical artifact file names inside a model directory.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const LABEL_MAPPING_FILE: &str = "label_mapping.json";

/// Truncation limit the intent model was exported with.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 256;

/// Characteristics of a loaded model
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Maximum sequence length fed to the model; longer inputs are truncated
    pub max_sequence_length: usize,
    /// Number of intent classes the classification head produces
    pub num_labels: usize,
}

/// Where to fetch model artifacts from, and how to verify them.
///
/// The intent model is a private fine-tune, so there is no fixed registry
/// of URLs or digests; callers supply both. Digests are optional and only
/// verified when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Name of the cache subdirectory the artifacts land in
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    /// Optional URL for `label_mapping.json`; absent upstream is fine,
    /// the default intents are used instead
    pub label_mapping_url: Option<String>,
    pub model_sha256: Option<String>,
    pub tokenizer_sha256: Option<String>,
}

impl ModelSpec {
    pub fn new(
        name: impl Into<String>,
        model_url: impl Into<String>,
        tokenizer_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model_url: model_url.into(),
            tokenizer_url: tokenizer_url.into(),
            label_mapping_url: None,
            model_sha256: None,
            tokenizer_sha256: None,
        }
    }

    pub fn with_label_mapping_url(mut self, url: impl Into<String>) -> Self {
        self.label_mapping_url = Some(url.into());
        self
    }

    pub fn with_model_sha256(mut self, digest: impl Into<String>) -> Self {
        self.model_sha256 = Some(digest.into());
        self
    }

    pub fn with_tokenizer_sha256(mut self, digest: impl Into<String>) -> Self {
        self.tokenizer_sha256 = Some(digest.into());
        self
    }
}
