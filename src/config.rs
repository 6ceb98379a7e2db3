//! Runtime configuration for the finder and the deck builder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::embedding::{DEFAULT_EMBEDDING_DIMS, EncoderKind};
use crate::error::ConfigError;
use crate::similarity::{
    DEFAULT_IMPORTANT_PHRASES, SimilarityConfig, SimilarityMetric, WeightVector,
};

/// Candidates fetched per substituted card.
pub const DEFAULT_CANDIDATE_POOL: usize = 25;

/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub catalog_path: PathBuf,
    pub embeddings_cache_path: PathBuf,
    /// Recompute embeddings at startup even if the cache file is usable.
    pub recompute_embeddings: bool,
    /// Switching encoders needs a recompute when both produce the same
    /// vector length.
    pub encoder: EncoderKind,
    /// Hashed encoder only; the MiniLM model is fixed at 384.
    pub embedding_dims: usize,
    /// Where the MiniLM model is downloaded to; fastembed's default if unset.
    pub model_cache_dir: Option<PathBuf>,
    /// Validated on load.
    pub weights: WeightVector,
    pub metric: SimilarityMetric,
    pub important_phrases: Vec<String>,
    pub candidate_pool: usize,
    pub default_results: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("database/allCards.json"),
            embeddings_cache_path: PathBuf::from("embeddings_cache.json"),
            recompute_embeddings: false,
            encoder: EncoderKind::default(),
            embedding_dims: DEFAULT_EMBEDDING_DIMS,
            model_cache_dir: None,
            weights: WeightVector::default(),
            metric: SimilarityMetric::default(),
            important_phrases: DEFAULT_IMPORTANT_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .collect(),
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            default_results: 5,
        }
    }
}

impl FinderConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading configuration from {}", path.display());
        Self::from_json_str(&raw)
    }

    pub fn similarity(&self) -> SimilarityConfig {
        SimilarityConfig {
            weights: self.weights,
            metric: self.metric,
            important_phrases: self.important_phrases.clone(),
        }
    }
}
