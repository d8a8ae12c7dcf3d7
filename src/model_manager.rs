use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::{ModelSpec, LABEL_MAPPING_FILE, MODEL_FILE, TOKENIZER_FILE};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Downloads and caches model artifacts (model, tokenizer, label mapping).
///
/// Digests in the [`ModelSpec`] are verified when present; a spec without
/// digests skips verification. Downloads are serialized by an internal
/// mutex so concurrent callers cannot clobber each other's files.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_models_dir())
    }

    /// Returns the default models directory path:
    /// `MAILROOM_CACHE` env var, then the platform cache dir, then the
    /// home directory, then the system temp directory.
    pub fn default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("MAILROOM_CACHE") {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("mailroom").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("mailroom").join("models");
        }

        env::temp_dir().join("mailroom").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Directory the spec's artifacts live in; feed this to
    /// `ClassifierBuilder::with_model_dir`.
    pub fn model_dir(&self, spec: &ModelSpec) -> PathBuf {
        self.models_dir.join(&spec.name)
    }

    pub fn model_path(&self, spec: &ModelSpec) -> PathBuf {
        self.model_dir(spec).join(MODEL_FILE)
    }

    pub fn tokenizer_path(&self, spec: &ModelSpec) -> PathBuf {
        self.model_dir(spec).join(TOKENIZER_FILE)
    }

    pub fn label_mapping_path(&self, spec: &ModelSpec) -> PathBuf {
        self.model_dir(spec).join(LABEL_MAPPING_FILE)
    }

    /// The label mapping is optional, so only the model and tokenizer
    /// decide downloaded-ness.
    pub fn is_downloaded(&self, spec: &ModelSpec) -> bool {
        self.model_path(spec).exists() && self.tokenizer_path(spec).exists()
    }

    pub async fn download(&self, spec: &ModelSpec) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.model_dir(spec);
        fs::create_dir_all(&model_dir)?;

        let model_result = self
            .fetch_artifact(
                &spec.model_url,
                &self.model_path(spec),
                spec.model_sha256.as_deref(),
                "model",
            )
            .await;
        let tokenizer_result = self
            .fetch_artifact(
                &spec.tokenizer_url,
                &self.tokenizer_path(spec),
                spec.tokenizer_sha256.as_deref(),
                "tokenizer",
            )
            .await;

        if let Err(e) = model_result.and(tokenizer_result) {
            log::error!("Failed to set up model artifacts: {}", e);
            let _ = self.remove_download(spec);
            return Err(e);
        }

        // Label mapping failures are not fatal: the default intents cover
        // the absent-mapping case.
        if let Some(url) = &spec.label_mapping_url {
            if let Err(e) = self
                .fetch_artifact(url, &self.label_mapping_path(spec), None, "label mapping")
                .await
            {
                log::warn!("Could not fetch label mapping ({}), default intents apply", e);
            }
        }

        log::info!("Model artifacts ready in {:?}", model_dir);
        Ok(())
    }

    /// Downloads one artifact unless a verified copy already exists, then
    /// verifies what was written.
    async fn fetch_artifact(
        &self,
        url: &str,
        path: &Path,
        expected_sha256: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            if self.verify_file(path, expected_sha256)? {
                log::info!("Existing {} file verified, skipping download", file_type);
                return Ok(());
            }
            log::warn!("{} file failed verification, redownloading", file_type);
        }

        log::info!("Downloading {} file from {}", file_type, url);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::debug!("Downloaded {} bytes for {}", bytes.len(), file_type);

        if let Some(expected) = expected_sha256 {
            let actual = Self::sha256_hex(&bytes);
            if actual != expected {
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_sha256)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified", file_type);
        Ok(())
    }

    /// Verifies a file against an expected digest. With no digest the file
    /// only needs to exist and be readable.
    fn verify_file(&self, path: &Path, expected_sha256: Option<&str>) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        match expected_sha256 {
            Some(expected) => Ok(Self::sha256_hex(&bytes) == expected),
            None => Ok(!bytes.is_empty()),
        }
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Verifies all present artifacts for a spec.
    pub fn verify(&self, spec: &ModelSpec) -> Result<bool, ModelError> {
        if !self.is_downloaded(spec) {
            return Ok(false);
        }
        let model_ok = self.verify_file(&self.model_path(spec), spec.model_sha256.as_deref())?;
        let tokenizer_ok =
            self.verify_file(&self.tokenizer_path(spec), spec.tokenizer_sha256.as_deref())?;
        Ok(model_ok && tokenizer_ok)
    }

    pub fn remove_download(&self, spec: &ModelSpec) -> Result<(), ModelError> {
        for path in [
            self.model_path(spec),
            self.tokenizer_path(spec),
            self.label_mapping_path(spec),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures the spec's artifacts are downloaded and verified,
    /// re-downloading on corruption.
    pub async fn ensure_downloaded(&self, spec: &ModelSpec) -> Result<(), ModelError> {
        if !self.is_downloaded(spec) {
            log::info!("Model '{}' not found in cache, downloading...", spec.name);
            return self.download(spec).await;
        }
        if !self.verify(spec)? {
            log::warn!("Model '{}' failed verification, re-downloading...", spec.name);
            self.remove_download(spec)?;
            return self.download(spec).await;
        }
        log::info!("Model '{}' present and verified", spec.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_spec() -> ModelSpec {
        ModelSpec::new(
            "test-intent",
            "http://localhost:9/model.onnx",
            "http://localhost:9/tokenizer.json",
        )
    }

    #[test]
    fn test_artifact_paths() {
        let manager = ModelManager::new("/tmp/mailroom-test/models").unwrap();
        let spec = test_spec();
        assert!(manager
            .model_path(&spec)
            .ends_with("test-intent/model.onnx"));
        assert!(manager
            .tokenizer_path(&spec)
            .ends_with("test-intent/tokenizer.json"));
        assert!(manager
            .label_mapping_path(&spec)
            .ends_with("test-intent/label_mapping.json"));
    }

    #[test]
    fn test_remove_download_on_missing_files_is_ok() {
        let manager = ModelManager::new("/tmp/mailroom-test-remove/models").unwrap();
        assert!(manager.remove_download(&test_spec()).is_ok());
    }

    #[test]
    fn test_fresh_spec_not_downloaded() {
        let manager = ModelManager::new("/tmp/mailroom-test-fresh/models").unwrap();
        assert!(!manager.is_downloaded(&test_spec()));
    }
}
