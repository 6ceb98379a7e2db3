//! Error types for every engine component.
//!
//! Only [`CatalogError`] is fatal (at startup). The others are local and
//! recoverable: callers report them and keep the previous state.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read card catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed card catalog: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("encoder returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },
    #[error("encoder returned a {actual}-dimensional vector, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("encoder failed: {0}")]
    Encoder(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write embedding cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode embedding cache: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("weights must sum to 1.0 (got {sum:.4})")]
    InvalidSum { sum: f64 },
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("weight for '{feature}' must be a non-negative number (got {value})")]
    InvalidValue { feature: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoder '{0}' (expected one of: hashed, minilm)")]
pub struct UnknownEncoder(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown similarity metric '{0}' (expected one of: cosine, dot, euclidean, manhattan)")]
pub struct UnknownMetric(pub String);

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("card '{0}' not found")]
    CardNotFound(String),
    #[error("card finder is still initializing")]
    NotReady,
    #[error("card finder is already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("decklist line {line}: expected '<quantity> <card name>', got '{text}'")]
    InvalidLine { line: usize, text: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed collection: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}
