//! Per-feature similarity scores and the weighted overall score.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::embedding::{cosine_similarity, dot, euclidean_distance, manhattan_distance};
use crate::error::{UnknownMetric, WeightError};
use crate::features::FeatureBundle;

/// Every similarity value in the crate.
pub type Score = f64;

/// Allowed deviation of the weight sum from 1.0. The boundary is rejected.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// Distance at which Euclidean and Manhattan ability scores bottom out.
const MAX_DISTANCE: f64 = 20.0;

pub const DEFAULT_IMPORTANT_PHRASES: [&str; 3] =
    ["draw a card", "opposing players", "opposing characters"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    InkCost,
    Strength,
    Willpower,
    LorePoints,
    Tags,
    Ability,
    Mechanics,
    InkColor,
    CardType,
    Inkwell,
}

impl Feature {
    pub const COUNT: usize = 10;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::InkCost,
        Feature::Strength,
        Feature::Willpower,
        Feature::LorePoints,
        Feature::Tags,
        Feature::Ability,
        Feature::Mechanics,
        Feature::InkColor,
        Feature::CardType,
        Feature::Inkwell,
    ];

    /// Name used in weight maps, config files and score maps.
    pub fn name(self) -> &'static str {
        match self {
            Feature::InkCost => "ink_cost",
            Feature::Strength => "strength",
            Feature::Willpower => "willpower",
            Feature::LorePoints => "lore_points",
            Feature::Tags => "tags",
            Feature::Ability => "ability",
            Feature::Mechanics => "mechanics",
            Feature::InkColor => "ink_color",
            Feature::CardType => "card_type",
            Feature::Inkwell => "inkwell",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated feature weights. Non-negative, summing to 1.0 within
/// [`WEIGHT_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightVector([f64; Feature::COUNT]);

impl WeightVector {
    /// Validate a feature-name map. Features left out weigh 0.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, WeightError> {
        let mut weights = [0.0; Feature::COUNT];
        for (name, &value) in map {
            let feature = Feature::from_name(name)
                .ok_or_else(|| WeightError::UnknownFeature(name.clone()))?;
            if !value.is_finite() || value < 0.0 {
                return Err(WeightError::InvalidValue {
                    feature: name.clone(),
                    value,
                });
            }
            weights[feature.index()] = value;
        }
        let sum: f64 = weights.iter().sum();
        // Sums of exactly 0.999 and 1.001 are rejected despite rounding.
        if (sum - 1.0).abs() + 1e-9 >= WEIGHT_TOLERANCE {
            return Err(WeightError::InvalidSum { sum });
        }
        Ok(Self(weights))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Feature::ALL
            .into_iter()
            .map(|feature| (feature.name().to_string(), self.get(feature)))
            .collect()
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self([0.15, 0.10, 0.10, 0.10, 0.01, 0.24, 0.15, 0.05, 0.05, 0.05])
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightVector {
    type Error = WeightError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_map(&map)
    }
}

impl From<WeightVector> for BTreeMap<String, f64> {
    fn from(weights: WeightVector) -> Self {
        weights.to_map()
    }
}

/// Vector comparison used for the ability-text feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
    Manhattan,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 4] = [
        SimilarityMetric::Cosine,
        SimilarityMetric::DotProduct,
        SimilarityMetric::Euclidean,
        SimilarityMetric::Manhattan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::DotProduct => "dot",
            SimilarityMetric::Euclidean => "euclidean",
            SimilarityMetric::Manhattan => "manhattan",
        }
    }

    /// Raw vector score, mapped so that larger means more similar.
    pub fn base_score(self, a: &[f32], b: &[f32]) -> Score {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::DotProduct => dot(a, b),
            SimilarityMetric::Euclidean => (1.0 - euclidean_distance(a, b) / MAX_DISTANCE).max(0.0),
            SimilarityMetric::Manhattan => (1.0 - manhattan_distance(a, b) / MAX_DISTANCE).max(0.0),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimilarityMetric {
    type Err = UnknownMetric;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lower = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|metric| metric.name() == lower)
            .ok_or_else(|| UnknownMetric(raw.to_string()))
    }
}

impl TryFrom<String> for SimilarityMetric {
    type Error = UnknownMetric;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<SimilarityMetric> for String {
    fn from(metric: SimilarityMetric) -> Self {
        metric.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub weights: WeightVector,
    pub metric: SimilarityMetric,
    pub important_phrases: Vec<String>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: WeightVector::default(),
            metric: SimilarityMetric::default(),
            important_phrases: DEFAULT_IMPORTANT_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .collect(),
        }
    }
}

/// Per-feature scores for one card pair. Serializes as `{feature: score}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureScores([Score; Feature::COUNT]);

impl FeatureScores {
    pub fn get(&self, feature: Feature) -> Score {
        self.0[feature.index()]
    }

    fn set(&mut self, feature: Feature, score: Score) {
        self.0[feature.index()] = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, Score)> + '_ {
        Feature::ALL.into_iter().map(|feature| (feature, self.get(feature)))
    }

    /// Weighted sum, clamped into [0, 1].
    pub fn overall(&self, weights: &WeightVector) -> Score {
        self.iter()
            .map(|(feature, score)| weights.get(feature) * score)
            .sum::<Score>()
            .clamp(0.0, 1.0)
    }
}

impl Serialize for FeatureScores {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(Feature::COUNT))?;
        for (feature, score) in self.iter() {
            map.serialize_entry(feature.name(), &score)?;
        }
        map.end()
    }
}

/// Inclusive value range a numeric feature is normalized over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDomain {
    pub min: f64,
    pub max: f64,
}

impl NumericDomain {
    pub const INK_COST: NumericDomain = NumericDomain { min: 1.0, max: 10.0 };
    pub const STRENGTH: NumericDomain = NumericDomain { min: 1.0, max: 10.0 };
    pub const WILLPOWER: NumericDomain = NumericDomain { min: 1.0, max: 10.0 };
    pub const LORE: NumericDomain = NumericDomain { min: 0.0, max: 5.0 };

    fn normalize(self, value: i32) -> f64 {
        (f64::from(value) - self.min) / (self.max - self.min)
    }
}

/// `1 - |n1 - n2|` over domain-normalized values, clamped into [0, 1].
pub fn numeric_similarity(a: i32, b: i32, domain: NumericDomain) -> Score {
    (1.0 - (domain.normalize(a) - domain.normalize(b)).abs()).clamp(0.0, 1.0)
}

/// Exact match; 0 when either side is missing.
pub fn categorical_similarity<T: PartialEq>(a: Option<T>, b: Option<T>) -> Score {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    }
}

/// |A ∩ B| / |A ∪ B|, defined as 0 when both sets are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Score {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as Score / union as Score
}

pub fn inkable_similarity(a: bool, b: bool) -> Score {
    match (a, b) {
        (true, true) => 1.0,
        (false, false) => 0.5,
        _ => 0.0,
    }
}

/// `1 + 0.1` per important phrase found in the text, capped at 1.5.
pub fn phrase_boost(text: &str, phrases: &[String]) -> Score {
    let lower = text.to_lowercase();
    let matches = phrases
        .iter()
        .filter(|phrase| lower.contains(phrase.as_str()))
        .count();
    (1.0 + 0.1 * matches as Score).min(1.5)
}

/// One side of a comparison: a card's features and its cached embedding.
#[derive(Debug, Clone, Copy)]
pub struct CardView<'a> {
    pub bundle: &'a FeatureBundle,
    pub embedding: Option<&'a [f32]>,
}

impl<'a> CardView<'a> {
    pub fn new(bundle: &'a FeatureBundle, embedding: Option<&'a [f32]>) -> Self {
        Self { bundle, embedding }
    }
}

/// Scores card pairs under one [`SimilarityConfig`].
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    pub fn set_weights(&mut self, weights: WeightVector) {
        self.config.weights = weights;
    }

    pub fn set_metric(&mut self, metric: SimilarityMetric) {
        self.config.metric = metric;
    }

    /// Ability-text similarity under `metric`, phrase-boosted and clamped.
    /// 0 when either text is blank or either embedding is missing.
    pub fn ability_similarity(
        &self,
        a: CardView<'_>,
        b: CardView<'_>,
        metric: SimilarityMetric,
    ) -> Score {
        if !a.bundle.has_ability_text() || !b.bundle.has_ability_text() {
            return 0.0;
        }
        let (Some(emb_a), Some(emb_b)) = (a.embedding, b.embedding) else {
            return 0.0;
        };
        let base = metric.base_score(emb_a, emb_b);
        let phrases = &self.config.important_phrases;
        let boost = (phrase_boost(&a.bundle.ability_text, phrases)
            + phrase_boost(&b.bundle.ability_text, phrases))
            / 2.0;
        (base * boost).clamp(0.0, 1.0)
    }

    pub fn feature_scores(&self, a: CardView<'_>, b: CardView<'_>) -> FeatureScores {
        let (fa, fb) = (a.bundle, b.bundle);
        let mut scores = FeatureScores::default();
        scores.set(
            Feature::InkCost,
            numeric_similarity(fa.ink_cost, fb.ink_cost, NumericDomain::INK_COST),
        );
        scores.set(
            Feature::Strength,
            numeric_similarity(fa.strength, fb.strength, NumericDomain::STRENGTH),
        );
        scores.set(
            Feature::Willpower,
            numeric_similarity(fa.willpower, fb.willpower, NumericDomain::WILLPOWER),
        );
        scores.set(
            Feature::LorePoints,
            numeric_similarity(fa.lore, fb.lore, NumericDomain::LORE),
        );
        scores.set(Feature::Tags, jaccard(&fa.tags, &fb.tags));
        scores.set(
            Feature::Ability,
            self.ability_similarity(a, b, self.config.metric),
        );
        scores.set(Feature::Mechanics, jaccard(&fa.mechanics, &fb.mechanics));
        scores.set(Feature::InkColor, categorical_similarity(fa.color, fb.color));
        scores.set(
            Feature::CardType,
            categorical_similarity(fa.card_type, fb.card_type),
        );
        scores.set(Feature::Inkwell, inkable_similarity(fa.inkable, fb.inkable));
        scores
    }

    /// Per-feature scores plus their weighted overall score.
    pub fn compare(&self, a: CardView<'_>, b: CardView<'_>) -> (FeatureScores, Score) {
        let scores = self.feature_scores(a, b);
        let overall = scores.overall(&self.config.weights);
        (scores, overall)
    }
}
