//! Card catalog: loading, filtering, and name lookup.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::card::CardRecord;
use crate::error::CatalogError;
use crate::names::sanitize_name;

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    cards: Vec<CardRecord>,
}

/// Filtered, deduplicated set of cards indexed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CardRecord>,
    /// Sanitized simple name -> record index
    by_key: HashMap<String, usize>,
    /// Sanitized full name -> record index
    by_full_name: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from raw records, applying the enchanted/promotional
    /// filters and full-name deduplication.
    pub fn from_records(raw: impl IntoIterator<Item = CardRecord>) -> Self {
        let mut records: Vec<CardRecord> = Vec::new();
        let mut slot_by_full_name: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;

        for mut record in raw {
            total += 1;
            if record.is_enchanted() || record.is_promotional() {
                continue;
            }
            record.assign_key();
            match slot_by_full_name.get(&record.full_name) {
                Some(&slot) => {
                    // Prefer the non-variant printing, keeping the first position.
                    if records[slot].is_variant() && !record.is_variant() {
                        records[slot] = record;
                    }
                }
                None => {
                    slot_by_full_name.insert(record.full_name.clone(), records.len());
                    records.push(record);
                }
            }
        }

        let mut catalog = Catalog::default();
        for record in records {
            if record.key().is_empty() || catalog.by_key.contains_key(record.key()) {
                log::debug!(
                    "Dropping '{}': simple name collides with an earlier card",
                    record.full_name
                );
                continue;
            }
            let index = catalog.records.len();
            catalog.by_key.insert(record.key().to_string(), index);
            catalog
                .by_full_name
                .entry(sanitize_name(&record.full_name))
                .or_insert(index);
            catalog.records.push(record);
        }

        log::info!(
            "Catalog ready: {} cards kept out of {} records",
            catalog.records.len(),
            total
        );
        catalog
    }

    /// Parse a catalog document (`{"cards": [...]}`).
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Ok(Self::from_records(file.cards))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_reader(reader)?;
        Ok(Self::from_records(file.cards))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading card catalog from {}", path.display());
        Self::from_json_str(&raw)
    }

    /// Look up a card by its simple name (both sides sanitized).
    pub fn find_by_simple_name(&self, name: &str) -> Option<&CardRecord> {
        self.by_key.get(&sanitize_name(name)).map(|&i| &self.records[i])
    }

    /// Look up a card by its full name (both sides sanitized).
    pub fn find_by_full_name(&self, name: &str) -> Option<&CardRecord> {
        self.by_full_name
            .get(&sanitize_name(name))
            .map(|&i| &self.records[i])
    }

    /// Simple-name lookup with a full-name fallback.
    pub fn find(&self, name: &str) -> Option<&CardRecord> {
        self.find_by_simple_name(name)
            .or_else(|| self.find_by_full_name(name))
    }

    /// Index of a card in catalog order, resolved the same way as [`find`](Self::find).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let key = sanitize_name(name);
        self.by_key
            .get(&key)
            .or_else(|| self.by_full_name.get(&key))
            .copied()
    }

    pub fn get(&self, index: usize) -> Option<&CardRecord> {
        self.records.get(index)
    }

    /// All cards in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CardRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name search for autocomplete: cards whose simple name contains the
    /// term, prefix matches first, then alphabetical.
    pub fn search(&self, term: &str, limit: usize) -> Vec<&CardRecord> {
        let term = sanitize_name(term);
        if term.chars().count() < 2 {
            return Vec::new();
        }
        let mut matches: Vec<&CardRecord> = self
            .records
            .iter()
            .filter(|record| record.key().contains(&term))
            .collect();
        matches.sort_by(|a, b| {
            let a_prefix = a.key().starts_with(&term);
            let b_prefix = b.key().starts_with(&term);
            b_prefix.cmp(&a_prefix).then_with(|| a.key().cmp(b.key()))
        });
        matches.truncate(limit);
        matches
    }
}
