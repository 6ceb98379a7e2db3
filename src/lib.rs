pub mod card;
pub mod catalog;
pub mod color;
pub mod config;
pub mod deck;
pub mod embedding;
pub mod embedding_cache;
pub mod error;
pub mod features;
pub mod finder;
#[cfg(feature = "fastembed")]
pub mod minilm;
pub mod names;
pub mod similarity;
pub mod types;

#[cfg(test)]
mod tests;

pub use card::{CardAbility, CardImages, CardRecord, CardRecordBuilder};
pub use catalog::Catalog;
pub use color::{InkColor, InkSet};
pub use config::FinderConfig;
pub use deck::{
    Candidate, CandidateSource, Collection, DeckResult, Decklist, MAX_COPIES, ReplacementEntry,
    ReplacementReason, color_identity, substitute_deck,
};
pub use embedding::{
    DEFAULT_EMBEDDING_DIMS, EncoderKind, HashedTextEncoder, NoProgress, ProgressObserver,
    TextEncoder,
};
pub use embedding_cache::EmbeddingCache;
pub use error::{
    CacheError, CatalogError, ConfigError, DeckError, EmbeddingError, FinderError, UnknownEncoder,
    UnknownMetric, WeightError,
};
pub use features::FeatureBundle;
pub use finder::{AbilityMatch, CardFinder, FinderService, SimilarCard, SimilarityResult};
#[cfg(feature = "fastembed")]
pub use minilm::{MINILM_DIMS, MiniLmEncoder};
pub use names::sanitize_name;
pub use similarity::{
    Feature, FeatureScores, Score, SimilarityConfig, SimilarityEngine, SimilarityMetric,
    WeightVector,
};
pub use types::{AbilityKind, CardType};
