//! Canonical card-name keys.
//!
//! Decklists, collections, the catalog and the embedding cache all join on
//! the sanitized form produced here.

/// Sanitizes a card name into its canonical key.
///
/// Strips `!` and `.`, collapses the `" - "` title separator into a single
/// space, lowercases, and collapses runs of whitespace.
pub fn sanitize_name(raw: &str) -> String {
    let stripped = raw.replace('!', "").replace(" - ", " ").replace('.', "");
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
