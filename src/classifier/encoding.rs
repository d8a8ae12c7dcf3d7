use std::collections::HashMap;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::error::ClassifierError;

/// Turns text into per-class logits via the tokenizer and the ONNX session.
///
/// The ONNX model is expected to be a sequence-classification head:
/// - Inputs: `input_ids` and `attention_mask`, both `[batch_size, seq_len]` i64
/// - Output: logits of shape `[batch_size, num_labels]` f32
///
/// Inputs longer than `max_sequence_length` are tail-truncated before the
/// tensors are built; truncation is this layer's policy, not an error.
pub(crate) trait TextEncoding {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the maximum sequence length the model accepts
    fn max_sequence_length(&self) -> Option<usize>;

    /// Counts the number of tokens in the text without running the model.
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Tokenizes the text (with special tokens) and truncates the id
    /// sequence to `max_sequence_length`.
    fn encode(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self
            .max_sequence_length()
            .ok_or_else(|| ClassifierError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let mut token_ids = encoding.get_ids().to_vec();
        if token_ids.len() > max_length {
            log::debug!(
                "Input of {} tokens truncated to {}",
                token_ids.len(),
                max_length
            );
            token_ids.truncate(max_length);
        }
        Ok(token_ids)
    }

    /// Tokenizes the text and runs the model, returning one logit per class.
    fn class_logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let tokens = self.encode(text)?;
        self.run_logits(&tokens)
    }

    /// Runs the ONNX model on a token id sequence and extracts the logits row.
    fn run_logits(&self, tokens: &[u32]) -> Result<Vec<f32>, ClassifierError> {
        let session = self
            .session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;
        if tokens.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Cannot run the model on an empty token sequence".into(),
            ));
        }

        let input_array =
            Array2::from_shape_vec((1, tokens.len()), tokens.iter().map(|&x| x as i64).collect())
                .map_err(|e| {
                    ClassifierError::ModelError(format!("Failed to create input array: {}", e))
                })?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        // No padding on a single sequence, so the mask is all ones.
        let mask_array = Array2::from_shape_vec((1, tokens.len()), vec![1i64; tokens.len()])
            .map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create mask array: {}", e))
            })?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create input tensor: {}", e))
            })?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e))
            })?,
        );

        let outputs = session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let logits = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::ModelError(format!("Failed to extract logits tensor: {}", e))
        })?;

        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::ModelError(format!(
                "Expected logits of shape [1, num_labels], got {:?}",
                shape
            )));
        }

        Ok(logits.slice(ndarray::s![0, ..]).iter().cloned().collect())
    }
}
