use std::collections::BTreeMap;

use lorefinder::{
    CardFinder, Catalog, Feature, FinderError, HashedTextEncoder, NoProgress, SimilarityConfig,
    SimilarityMetric,
};

const CARDS: &str = include_str!("fixtures/all_cards.json");

fn finder() -> CardFinder {
    let catalog = Catalog::from_json_str(CARDS).expect("fixture catalog should parse");
    CardFinder::with_encoder(
        catalog,
        &HashedTextEncoder::default(),
        SimilarityConfig::default(),
        &mut NoProgress,
    )
    .expect("hashed encoder never fails")
}

#[test]
fn catalog_filters_enchanted_promos_and_variants() {
    let finder = finder();
    let catalog = finder.catalog();
    assert_eq!(catalog.len(), 10);
    let elsa = catalog.find("Elsa - Snow Queen").expect("elsa is kept");
    assert_eq!(elsa.rarity, "Rare");
    let genie = catalog.find("genie on the job").expect("genie is kept");
    assert!(genie.variant.is_none(), "non-variant printing wins");
    assert_eq!(catalog.find("mystery box").and_then(|r| r.card_type), None);
}

#[test]
fn ranking_excludes_target_and_is_sorted() {
    let finder = finder();
    let result = finder.find_similar("Example Card A", 20).unwrap();
    assert_eq!(result.target.full_name, "Example Card A");
    assert_eq!(result.matches.len(), 9);
    assert!(result.matches.iter().all(|m| m.record.full_name != "Example Card A"));
    for pair in result.matches.windows(2) {
        assert!(pair[0].overall >= pair[1].overall, "ranking must be descending");
    }
    for m in &result.matches {
        assert!((0.0..=1.0).contains(&m.overall), "{} scored {}", m.record.full_name, m.overall);
    }
}

#[test]
fn closest_cards_share_stats_and_draw_text() {
    let finder = finder();
    let result = finder.find_similar("example card a", 2).unwrap();
    let mut top: Vec<&str> = result.matches.iter().map(|m| m.record.key()).collect();
    top.sort();
    assert_eq!(top, vec!["example card b", "example card c"]);
}

#[test]
fn ranking_is_repeatable() {
    let finder = finder();
    let first: Vec<(String, f64)> = finder
        .find_similar("Lonely Card", 5)
        .unwrap()
        .matches
        .iter()
        .map(|m| (m.record.key().to_string(), m.overall))
        .collect();
    let second: Vec<(String, f64)> = finder
        .find_similar("Lonely Card", 5)
        .unwrap()
        .matches
        .iter()
        .map(|m| (m.record.key().to_string(), m.overall))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn unknown_card_reports_not_found() {
    let err = finder().find_similar("Nobody - Anywhere", 5).unwrap_err();
    assert!(matches!(err, FinderError::CardNotFound(ref name) if name == "Nobody - Anywhere"));
}

#[test]
fn weights_and_metric_are_runtime_configurable() {
    let finder = finder();
    let ability_only: BTreeMap<String, f64> = [("ability".to_string(), 1.0)].into_iter().collect();
    finder.update_weights(&ability_only).unwrap();

    let bad: BTreeMap<String, f64> = [("ability".to_string(), 0.999)].into_iter().collect();
    assert!(finder.update_weights(&bad).is_err());
    assert_eq!(finder.config().weights.get(Feature::Ability), 1.0);

    for metric in SimilarityMetric::ALL {
        finder.set_metric(metric);
        let result = finder.find_similar("Example Card A", 3).unwrap();
        let best = &result.matches[0];
        assert_eq!(best.overall, best.scores.get(Feature::Ability), "{metric}");
        assert!((0.0..=1.0).contains(&best.overall));
    }
}

#[test]
fn ability_neighbors_rank_identical_text_first() {
    let finder = finder();
    let matches = finder
        .ability_neighbors("Example Card A", SimilarityMetric::Cosine, 3)
        .unwrap();
    assert_eq!(matches[0].record.key(), "example card c");
    assert_eq!(matches[0].score, 1.0);
}

#[test]
fn similarity_result_serializes_feature_map() {
    let finder = finder();
    let result = finder.find_similar("Example Card A", 1).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["target"]["fullName"], "Example Card A");
    let scores = json["matches"][0]["scores"].as_object().unwrap();
    assert!(scores.contains_key("lore_points"));
    assert!(scores.contains_key("ink_color"));
}
