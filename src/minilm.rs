//! Sentence embeddings from all-MiniLM-L6-v2, run locally through fastembed.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embedding::{ProgressObserver, TextEncoder};
use crate::error::EmbeddingError;

/// Output width of all-MiniLM-L6-v2.
pub const MINILM_DIMS: usize = 384;

const BATCH_SIZE: usize = 32;

pub struct MiniLmEncoder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEncoder {
    /// Load the model, downloading it into fastembed's default cache
    /// directory on first use.
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_options(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
    }

    /// Load the model from (or download it into) `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self, EmbeddingError> {
        Self::with_options(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_cache_dir(cache_dir.into()),
        )
    }

    fn with_options(options: InitOptions) -> Result<Self, EmbeddingError> {
        log::info!("Loading all-MiniLM-L6-v2 embedding model");
        let model = TextEmbedding::try_new(options.with_show_download_progress(true))
            .map_err(|err| EmbeddingError::Encoder(format!("failed to load model: {err}")))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl std::fmt::Debug for MiniLmEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEncoder").finish_non_exhaustive()
    }
}

impl TextEncoder for MiniLmEncoder {
    fn dims(&self) -> usize {
        MINILM_DIMS
    }

    fn encode_batch(
        &self,
        texts: &[&str],
        progress: &mut dyn ProgressObserver,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let total = texts.len();
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        progress.report(0, total);
        let model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let vectors = model
            .embed(texts.to_vec(), Some(BATCH_SIZE))
            .map_err(|err| EmbeddingError::Encoder(err.to_string()))?;
        progress.report(total, total);
        Ok(vectors)
    }
}
