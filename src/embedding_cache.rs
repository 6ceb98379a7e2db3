//! Persistent ability-text embeddings keyed by card simple name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::card::CardRecord;
use crate::embedding::{ProgressObserver, TextEncoder};
use crate::error::{CacheError, EmbeddingError};
use crate::features::FeatureBundle;

/// Simple name -> embedding vector. Loaded and saved as a whole, and only
/// ever replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingCache {
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted cache. A missing or unreadable file yields an empty
    /// cache that has to be recomputed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No cached embeddings at {}", path.display());
                return Self::new();
            }
            Err(err) => {
                log::warn!("Failed to read embedding cache {}: {err}", path.display());
                return Self::new();
            }
        };
        match serde_json::from_str::<HashMap<String, Vec<f32>>>(&raw) {
            Ok(vectors) => {
                log::info!(
                    "Loaded {} cached embeddings from {}",
                    vectors.len(),
                    path.display()
                );
                Self { vectors }
            }
            Err(err) => {
                log::warn!(
                    "Ignoring malformed embedding cache {}: {err}",
                    path.display()
                );
                Self::new()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let path = path.as_ref();
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string(&self.vectors)?;
        fs::write(path, raw).map_err(io_err)?;
        log::info!(
            "Saved {} embeddings to {}",
            self.vectors.len(),
            path.display()
        );
        Ok(())
    }

    /// Re-encode every card with non-empty ability text in one batch and
    /// replace the whole cache. On encoder failure the cache is unchanged.
    ///
    /// `records` and `bundles` are parallel slices.
    pub fn recompute(
        &mut self,
        records: &[CardRecord],
        bundles: &[FeatureBundle],
        encoder: &dyn TextEncoder,
        progress: &mut dyn ProgressObserver,
    ) -> Result<(), CacheError> {
        let mut names = Vec::new();
        let mut texts = Vec::new();
        for (record, bundle) in records.iter().zip(bundles) {
            if bundle.has_ability_text() {
                names.push(record.key());
                texts.push(bundle.ability_text.as_str());
            }
        }

        log::info!("Computing ability embeddings for {} cards", texts.len());
        let vectors = encoder.encode_batch(&texts, progress)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != encoder.dims()) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: encoder.dims(),
                actual: bad.len(),
            }
            .into());
        }

        self.vectors = names
            .into_iter()
            .map(str::to_string)
            .zip(vectors)
            .collect();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.vectors.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, vector: Vec<f32>) {
        self.vectors.insert(name.into(), vector);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector length, if the cache holds anything.
    pub fn dims(&self) -> Option<usize> {
        self.vectors.values().next().map(Vec::len)
    }
}
