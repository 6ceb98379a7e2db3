use std::collections::BTreeMap;

use lorefinder::{
    CardFinder, CardRecordBuilder, CardType, Catalog, Collection, Decklist, HashedTextEncoder,
    InkColor, MAX_COPIES, NoProgress, ReplacementReason, SimilarityConfig, color_identity,
    substitute_deck,
};

const CARDS: &str = include_str!("fixtures/all_cards.json");
const POOL: usize = 25;

fn finder() -> CardFinder {
    let catalog = Catalog::from_json_str(CARDS).expect("fixture catalog should parse");
    finder_over(catalog)
}

fn finder_over(catalog: Catalog) -> CardFinder {
    CardFinder::with_encoder(
        catalog,
        &HashedTextEncoder::default(),
        SimilarityConfig::default(),
        &mut NoProgress,
    )
    .expect("hashed encoder never fails")
}

fn reasons(log: &[lorefinder::ReplacementEntry]) -> Vec<String> {
    log.iter().map(|entry| entry.reason.to_string()).collect()
}

#[test]
fn owned_copy_is_used_then_same_color_substitute() {
    let finder = finder();
    let decklist = Decklist::parse("2 Example Card A").unwrap();
    let mut collection = Collection::from_counts([("example card a", 1), ("example card b", 3)]);

    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);

    let expected: BTreeMap<String, u32> = [
        ("example card a".to_string(), 1),
        ("example card b".to_string(), 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(result.final_deck, expected);

    let log = &result.replacement_log["example card a"];
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].reason, ReplacementReason::UsedFromCollection);
    assert_eq!(log[1].card.as_deref(), Some("example card b"));
    assert!(
        log[1].reason.to_string().starts_with("substituted, similarity score = "),
        "unexpected reason: {}",
        log[1].reason
    );
    assert_eq!(collection.count("example card a"), 0);
    assert_eq!(collection.count("example card b"), 2);
}

#[test]
fn no_same_color_candidate_drops_every_copy() {
    let finder = finder();
    let decklist = Decklist::parse("2 Lonely Card").unwrap();
    let mut collection = Collection::from_counts([
        ("example card b", 3),
        ("example card c", 2),
        ("jetsam opportunistic eel", 2),
    ]);
    let before = collection.clone();

    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);

    assert_eq!(result.final_deck.get("lonely card"), None);
    assert_eq!(result.total_cards(), 0);
    assert_eq!(
        reasons(&result.replacement_log["lonely card"]),
        vec!["no substitute available", "no substitute available"]
    );
    assert_eq!(collection, before, "nothing is consumed when nothing qualifies");
}

#[test]
fn unknown_card_logs_a_single_error() {
    let finder = finder();
    let decklist = Decklist::parse("3 Nobody Anywhere\n1 Example Card A").unwrap();
    let mut collection = Collection::from_counts([("example card a", 1)]);

    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);

    let log = &result.replacement_log["nobody anywhere"];
    assert_eq!(log.len(), 1);
    assert!(log[0].reason.to_string().starts_with("error: "));
    assert_eq!(result.final_deck["example card a"], 1);
}

#[test]
fn copies_are_capped_at_four() {
    let finder = finder();
    let decklist = Decklist::parse("6 Example Card A\n3 example card a").unwrap();
    let mut collection = Collection::from_counts([("example card a", 10), ("example card b", 10)]);

    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);

    assert!(result.final_deck.values().all(|count| *count <= MAX_COPIES));
    assert_eq!(result.final_deck["example card a"], MAX_COPIES);
    assert_eq!(result.final_deck["example card b"], MAX_COPIES);
    assert_eq!(collection.count("example card a"), 6);
    assert_eq!(result.replacement_log["example card a"].len(), 9);
}

#[test]
fn color_identity_comes_from_resolved_cards() {
    let finder = finder();
    let decklist =
        Decklist::parse("4 Lonely Card\n2 Elsa - Snow Queen\n1 Example Card A\n1 Ghost")
            .unwrap();
    let identity = color_identity(&decklist, &finder);
    assert_eq!(identity.count(), 2);
    assert!(identity.contains(InkColor::Ruby));
    assert!(identity.contains(InkColor::Amethyst));
}

#[test]
fn deck_result_serializes_reasons_as_text() {
    let finder = finder();
    let decklist = Decklist::parse("1 Example Card A").unwrap();
    let mut collection = Collection::from_counts([("example card a", 1)]);
    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["final_deck"]["example card a"], 1);
    assert_eq!(
        json["replacement_log"]["example card a"][0]["reason"],
        "used from collection"
    );
}

#[test]
fn full_name_entries_use_the_catalog_key() {
    let catalog = Catalog::from_records(vec![
        CardRecordBuilder::new("Te Kā - Heartless")
            .simple_name("Te Ka - Heartless")
            .card_type(CardType::Character)
            .cost(6)
            .stats(6, 6, 2)
            .color(InkColor::Ruby)
            .build(),
        CardRecordBuilder::new("Other Card")
            .card_type(CardType::Character)
            .cost(6)
            .stats(5, 6, 2)
            .color(InkColor::Ruby)
            .build(),
    ]);
    let finder = finder_over(catalog);
    let decklist = Decklist::parse("1 Te Kā - Heartless\n1 Other Card").unwrap();
    let mut collection =
        Collection::from_counts([("Te Kā - Heartless", 1), ("te ka heartless", 2)]);

    let result = substitute_deck(&decklist, &mut collection, &finder, POOL);

    assert_eq!(
        reasons(&result.replacement_log["te ka heartless"]),
        vec!["used from collection"]
    );
    assert_eq!(
        reasons(&result.replacement_log["other card"]),
        vec!["no substitute available"]
    );
    assert_eq!(result.final_deck.len(), 1);
    assert_eq!(result.final_deck["te ka heartless"], 1);
    assert_eq!(collection.count("te ka heartless"), 2);
}
