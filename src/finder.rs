//! Card ranking over the whole catalog, and the readiness-gated service
//! that owns the shared finder.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::card::CardRecord;
use crate::catalog::Catalog;
use crate::config::FinderConfig;
use crate::embedding::{ProgressObserver, TextEncoder};
use crate::embedding_cache::EmbeddingCache;
use crate::error::{CacheError, FinderError, WeightError};
use crate::features::FeatureBundle;
use crate::similarity::{
    CardView, FeatureScores, Score, SimilarityConfig, SimilarityEngine, SimilarityMetric,
    WeightVector,
};

#[derive(Debug, Clone, Serialize)]
pub struct SimilarCard<'a> {
    pub record: &'a CardRecord,
    pub scores: FeatureScores,
    pub overall: Score,
}

/// A target card and its best matches, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult<'a> {
    pub target: &'a CardRecord,
    pub matches: Vec<SimilarCard<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbilityMatch<'a> {
    pub record: &'a CardRecord,
    pub score: Score,
}

/// Ranks catalog cards against a target. Catalog, bundles and embeddings
/// are read-only after construction; only the similarity configuration
/// changes at runtime.
#[derive(Debug)]
pub struct CardFinder {
    catalog: Catalog,
    /// Parallel to `catalog.records()`.
    bundles: Vec<FeatureBundle>,
    cache: EmbeddingCache,
    engine: RwLock<SimilarityEngine>,
}

impl CardFinder {
    pub fn new(catalog: Catalog, cache: EmbeddingCache, similarity: SimilarityConfig) -> Self {
        let bundles = catalog.iter().map(FeatureBundle::from_record).collect();
        Self {
            catalog,
            bundles,
            cache,
            engine: RwLock::new(SimilarityEngine::new(similarity)),
        }
    }

    /// Build with freshly computed embeddings held in memory only.
    pub fn with_encoder(
        catalog: Catalog,
        encoder: &dyn TextEncoder,
        similarity: SimilarityConfig,
        progress: &mut dyn ProgressObserver,
    ) -> Result<Self, CacheError> {
        let mut finder = Self::new(catalog, EmbeddingCache::new(), similarity);
        finder.cache.recompute(
            finder.catalog.records(),
            &finder.bundles,
            encoder,
            progress,
        )?;
        Ok(finder)
    }

    /// Load the catalog and the embedding cache named by `config`. The cache
    /// is recomputed and saved when forced, empty, or built with a different
    /// vector length than `encoder` produces.
    pub fn open(
        config: &FinderConfig,
        encoder: &dyn TextEncoder,
        progress: &mut dyn ProgressObserver,
    ) -> Result<Self, FinderError> {
        let catalog = Catalog::load(&config.catalog_path)?;
        let cache = EmbeddingCache::load(&config.embeddings_cache_path);
        let mut finder = Self::new(catalog, cache, config.similarity());

        let stale_dims = finder
            .cache
            .dims()
            .is_some_and(|dims| dims != encoder.dims());
        if stale_dims {
            log::warn!(
                "Cached embeddings have {} dimensions, encoder produces {}; recomputing",
                finder.cache.dims().unwrap_or_default(),
                encoder.dims()
            );
        }
        if config.recompute_embeddings || finder.cache.is_empty() || stale_dims {
            finder.cache.recompute(
                finder.catalog.records(),
                &finder.bundles,
                encoder,
                progress,
            )?;
            finder.cache.save(&config.embeddings_cache_path)?;
        }
        Ok(finder)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn embeddings(&self) -> &EmbeddingCache {
        &self.cache
    }

    fn engine(&self) -> RwLockReadGuard<'_, SimilarityEngine> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn engine_mut(&self) -> RwLockWriteGuard<'_, SimilarityEngine> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> SimilarityConfig {
        self.engine().config().clone()
    }

    /// Replace the feature weights. Rejected maps leave the current weights
    /// in place.
    pub fn update_weights(&self, weights: &BTreeMap<String, f64>) -> Result<(), WeightError> {
        match WeightVector::from_map(weights) {
            Ok(weights) => {
                self.engine_mut().set_weights(weights);
                log::info!("Similarity weights updated");
                Ok(())
            }
            Err(err) => {
                log::warn!("Rejected weight update: {err}");
                Err(err)
            }
        }
    }

    pub fn set_metric(&self, metric: SimilarityMetric) {
        self.engine_mut().set_metric(metric);
        log::info!("Ability similarity metric set to {metric}");
    }

    fn view(&self, index: usize) -> CardView<'_> {
        let record = &self.catalog.records()[index];
        CardView::new(&self.bundles[index], self.cache.get(record.key()))
    }

    fn resolve(&self, name: &str) -> Result<usize, FinderError> {
        self.catalog
            .index_of(name)
            .ok_or_else(|| FinderError::CardNotFound(name.to_string()))
    }

    /// Indices of every card other than the target, one per full name.
    fn others(&self, target: usize) -> impl Iterator<Item = usize> + '_ {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(self.catalog.records()[target].full_name.as_str());
        self.catalog
            .iter()
            .enumerate()
            .filter(move |&(_, record)| seen.insert(record.full_name.as_str()))
            .map(|(index, _)| index)
    }

    /// The `n` cards most similar to `name`. The target never appears in its
    /// own result; equal scores keep catalog order.
    pub fn find_similar(&self, name: &str, n: usize) -> Result<SimilarityResult<'_>, FinderError> {
        let target = self.resolve(name)?;
        let engine = self.engine();
        let target_view = self.view(target);

        let mut matches: Vec<SimilarCard<'_>> = self
            .others(target)
            .map(|index| {
                let (scores, overall) = engine.compare(target_view, self.view(index));
                SimilarCard {
                    record: &self.catalog.records()[index],
                    scores,
                    overall,
                }
            })
            .collect();
        matches.sort_by(|a, b| b.overall.total_cmp(&a.overall));
        matches.truncate(n);

        Ok(SimilarityResult {
            target: &self.catalog.records()[target],
            matches,
        })
    }

    /// Cards ranked by ability-text similarity alone under `metric`, for
    /// comparing metrics against each other. Cards without ability text are
    /// skipped.
    pub fn ability_neighbors(
        &self,
        name: &str,
        metric: SimilarityMetric,
        n: usize,
    ) -> Result<Vec<AbilityMatch<'_>>, FinderError> {
        let target = self.resolve(name)?;
        let engine = self.engine();
        let target_view = self.view(target);

        let mut matches: Vec<AbilityMatch<'_>> = self
            .others(target)
            .filter(|&index| self.bundles[index].has_ability_text())
            .map(|index| AbilityMatch {
                record: &self.catalog.records()[index],
                score: engine.ability_similarity(target_view, self.view(index), metric),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(n);
        Ok(matches)
    }
}

/// Owns the shared [`CardFinder`] and refuses queries until it is fully
/// built.
#[derive(Debug, Default)]
pub struct FinderService {
    finder: OnceLock<Arc<CardFinder>>,
    current: AtomicUsize,
    total: AtomicUsize,
}

impl FinderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the finder from `config` and install it. Progress of the
    /// embedding pass is visible through [`progress`](Self::progress) while
    /// this runs.
    pub fn initialize(
        &self,
        config: &FinderConfig,
        encoder: &dyn TextEncoder,
    ) -> Result<Arc<CardFinder>, FinderError> {
        if self.is_ready() {
            return Err(FinderError::AlreadyInitialized);
        }
        let finder = CardFinder::open(config, encoder, &mut |current: usize, total: usize| {
            self.current.store(current, Ordering::Relaxed);
            self.total.store(total, Ordering::Relaxed);
        })?;
        self.install(finder)
    }

    /// Install an already built finder.
    pub fn install(&self, finder: CardFinder) -> Result<Arc<CardFinder>, FinderError> {
        let finder = Arc::new(finder);
        self.finder
            .set(Arc::clone(&finder))
            .map_err(|_| FinderError::AlreadyInitialized)?;
        log::info!("Card finder ready ({} cards)", finder.catalog().len());
        Ok(finder)
    }

    pub fn finder(&self) -> Result<Arc<CardFinder>, FinderError> {
        self.finder.get().cloned().ok_or(FinderError::NotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.finder.get().is_some()
    }

    /// `(current, total)` of the embedding pass; `(0, 0)` before it starts.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.current.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{HashedTextEncoder, NoProgress};
    use crate::similarity::Feature;
    use crate::tests::fixture_catalog;

    fn finder() -> CardFinder {
        CardFinder::with_encoder(
            fixture_catalog(),
            &HashedTextEncoder::new(128),
            SimilarityConfig::default(),
            &mut NoProgress,
        )
        .unwrap()
    }

    #[test]
    fn target_is_excluded_from_its_own_ranking() {
        let finder = finder();
        let result = finder.find_similar("Mickey Mouse - Brave Little Tailor", 50).unwrap();
        assert_eq!(result.target.key(), "mickey mouse brave little tailor");
        assert_eq!(result.matches.len(), finder.catalog().len() - 1);
        assert!(
            result
                .matches
                .iter()
                .all(|m| m.record.full_name != result.target.full_name)
        );
    }

    #[test]
    fn results_are_sorted_and_truncated() {
        let finder = finder();
        let result = finder.find_similar("mickey mouse brave little tailor", 3).unwrap();
        assert_eq!(result.matches.len(), 3);
        for pair in result.matches.windows(2) {
            assert!(pair[0].overall >= pair[1].overall);
        }
        for m in &result.matches {
            assert!((0.0..=1.0).contains(&m.overall));
        }
    }

    #[test]
    fn unknown_card_is_not_found() {
        assert!(matches!(
            finder().find_similar("Nobody - Anywhere", 5),
            Err(FinderError::CardNotFound(_))
        ));
    }

    #[test]
    fn rejected_weights_keep_previous_config() {
        let finder = finder();
        let before = finder.config();
        let mut bad = before.weights.to_map();
        bad.insert("ability".to_string(), 0.5);
        assert!(finder.update_weights(&bad).is_err());
        assert_eq!(finder.config(), before);

        let only_cost: BTreeMap<String, f64> =
            [("ink_cost".to_string(), 1.0)].into_iter().collect();
        finder.update_weights(&only_cost).unwrap();
        assert_eq!(finder.config().weights.get(Feature::InkCost), 1.0);

        let result = finder.find_similar("Mickey Mouse - Brave Little Tailor", 1).unwrap();
        assert_eq!(result.matches[0].overall, result.matches[0].scores.get(Feature::InkCost));
    }

    #[test]
    fn ability_neighbors_skip_textless_cards() {
        let finder = finder();
        for metric in SimilarityMetric::ALL {
            let matches = finder
                .ability_neighbors("Mickey Mouse - Brave Little Tailor", metric, 100)
                .unwrap();
            assert!(!matches.iter().any(|m| m.record.key() == "dinglehopper"));
            assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.score)));
        }
    }

    #[test]
    fn service_rejects_queries_until_installed() {
        let service = FinderService::new();
        assert!(matches!(service.finder(), Err(FinderError::NotReady)));
        assert_eq!(service.progress(), (0, 0));

        service.install(finder()).unwrap();
        assert!(service.is_ready());
        assert!(service.finder().is_ok());
        assert!(matches!(
            service.install(finder()),
            Err(FinderError::AlreadyInitialized)
        ));
    }
}
