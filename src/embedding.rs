//! Text embeddings for ability text.
//!
//! [`TextEncoder`] is the seam for the embedding model. The bundled
//! [`HashedTextEncoder`] is a deterministic feature-hashing encoder: token
//! n-grams and character n-grams are hashed into a fixed number of signed
//! buckets and the result is L2-normalized, so cosine similarity reduces to
//! a dot product. With the `fastembed` feature, [`MiniLmEncoder`] runs the
//! all-MiniLM-L6-v2 sentence model instead.
//!
//! [`MiniLmEncoder`]: crate::minilm::MiniLmEncoder

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, UnknownEncoder};

pub const DEFAULT_EMBEDDING_DIMS: usize = 384;

/// Which [`TextEncoder`] builds the embedding cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EncoderKind {
    #[default]
    Hashed,
    /// all-MiniLM-L6-v2 through fastembed; needs the `fastembed` feature.
    MiniLm,
}

impl EncoderKind {
    pub fn name(self) -> &'static str {
        match self {
            EncoderKind::Hashed => "hashed",
            EncoderKind::MiniLm => "minilm",
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncoderKind {
    type Err = UnknownEncoder;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hashed" => Ok(EncoderKind::Hashed),
            "minilm" | "all-minilm-l6-v2" => Ok(EncoderKind::MiniLm),
            _ => Err(UnknownEncoder(raw.to_string())),
        }
    }
}

impl TryFrom<String> for EncoderKind {
    type Error = UnknownEncoder;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<EncoderKind> for String {
    fn from(kind: EncoderKind) -> Self {
        kind.name().to_string()
    }
}

/// Receives coarse `(current, total)` progress from long batch operations.
pub trait ProgressObserver {
    fn report(&mut self, current: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressObserver for F {
    fn report(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}

/// Observer that discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&mut self, _current: usize, _total: usize) {}
}

/// A text-embedding model.
///
/// Implementations must encode the whole slice in one call; the cache never
/// encodes texts one at a time.
pub trait TextEncoder: Send + Sync {
    /// Length of every vector this encoder produces.
    fn dims(&self) -> usize;

    fn encode_batch(
        &self,
        texts: &[&str],
        progress: &mut dyn ProgressObserver,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Deterministic feature-hashing encoder.
#[derive(Debug, Clone, Copy)]
pub struct HashedTextEncoder {
    dims: usize,
    batch_size: usize,
}

impl HashedTextEncoder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            batch_size: 32,
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dims];
        let tokens = embedding_tokens(text);

        for token in &tokens {
            add_feature(&mut vec, &format!("u:{token}"), 1.0);
        }
        for window in tokens.windows(2) {
            add_feature(&mut vec, &format!("b:{}|{}", window[0], window[1]), 0.85);
        }
        for window in tokens.windows(3) {
            add_feature(
                &mut vec,
                &format!("t:{}|{}|{}", window[0], window[1], window[2]),
                1.0,
            );
        }

        // Structural anchors for common trigger and targeting shapes.
        let lower = text.to_lowercase();
        for marker in [
            "whenever",
            "when you play",
            "at the start of your turn",
            "at the end of your turn",
            "for each",
            "chosen opposing",
            "each opponent",
            "this turn",
        ] {
            if lower.contains(marker) {
                add_feature(&mut vec, &format!("m:{marker}"), 1.8);
            }
        }

        let compact = lower
            .chars()
            .filter(|ch| ch.is_alphanumeric() || *ch == ' ')
            .collect::<String>();
        let chars: Vec<char> = compact.chars().collect();
        for ngram in chars.windows(4).take(400) {
            let key = ngram.iter().collect::<String>();
            add_feature(&mut vec, &format!("c:{key}"), 0.2);
        }

        l2_normalize(&mut vec);
        vec
    }
}

impl Default for HashedTextEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMS)
    }
}

impl TextEncoder for HashedTextEncoder {
    fn dims(&self) -> usize {
        self.dims
    }

    fn encode_batch(
        &self,
        texts: &[&str],
        progress: &mut dyn ProgressObserver,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let total = texts.len();
        let mut out = Vec::with_capacity(total);
        for chunk in texts.chunks(self.batch_size.max(1)) {
            out.extend(chunk.iter().map(|text| self.embed(text)));
            progress.report(out.len(), total);
        }
        Ok(out)
    }
}

fn tokenize_text(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_braces = false;

    for ch in lower.chars() {
        if in_braces {
            current.push(ch);
            if ch == '}' {
                tokens.push(std::mem::take(&mut current));
                in_braces = false;
            }
            continue;
        }

        if ch == '{' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.push(ch);
            in_braces = true;
            continue;
        }

        if ch.is_alphanumeric() || matches!(ch, '+' | '-' | '\'') {
            current.push(ch);
            continue;
        }

        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn normalize_word(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    if matches!(
        token,
        "one" | "two" | "three" | "four" | "five" | "six" | "seven" | "eight" | "nine" | "ten"
    ) {
        return Some("<num>".to_string());
    }
    // Inline symbols such as {I} (ink), {S} (strength), {L} (lore).
    if token.starts_with('{') && token.ends_with('}') {
        return Some(token.to_string());
    }
    let trimmed = token.trim_matches(|c| matches!(c, '+' | '-'));
    if trimmed.parse::<i64>().is_ok() {
        return Some("<num>".to_string());
    }

    let mut base = token.trim_matches('\'').to_string();
    if base.ends_with("'s") {
        base.truncate(base.len().saturating_sub(2));
    }
    if base.len() > 4 && base.ends_with('s') {
        base.pop();
    }
    if base.is_empty() { None } else { Some(base) }
}

fn embedding_tokens(text: &str) -> Vec<String> {
    tokenize_text(text)
        .into_iter()
        .filter_map(|token| normalize_word(&token))
        .collect()
}

/// 64-bit FNV-1a. Stable across builds and platforms, so persisted vectors
/// stay reproducible.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn add_feature(vec: &mut [f32], feature: &str, weight: f32) {
    let hash = fnv1a(feature.as_bytes());
    let idx = (hash % vec.len() as u64) as usize;
    let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
    vec[idx] += sign * weight;
}

fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec {
            *v /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn norm(a: &[f32]) -> f64 {
    a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt()
}

/// Cosine similarity in [-1, 1]; 0 when either vector has no magnitude or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
        .sum::<f64>()
        .sqrt()
}

pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
        .sum()
}
