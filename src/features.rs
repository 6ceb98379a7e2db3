//! Feature extraction: turns a catalog record into the bundle the
//! similarity engine compares.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::card::CardRecord;
use crate::color::InkColor;
use crate::types::CardType;

/// Gameplay terms matched against ability and effect text.
pub const MECHANIC_KEYWORDS: [&str; 24] = [
    "bodyguard",
    "challenger",
    "evasive",
    "reckless",
    "resist",
    "rush",
    "shift",
    "singer",
    "support",
    "ward",
    "banish",
    "your hand",
    "their hand",
    "opposing players",
    "opposing characters",
    "draw",
    "shuffle",
    "damage",
    "heal",
    "remove",
    "chosen character",
    "location",
    "chosen item",
    "your inkwell",
];

/// Normalized features of a single card. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBundle {
    pub ink_cost: i32,
    pub strength: i32,
    pub willpower: i32,
    pub lore: i32,
    /// Mono-ink color; `None` for missing or dual-ink colors.
    pub color: Option<InkColor>,
    pub card_type: Option<CardType>,
    pub tags: BTreeSet<String>,
    pub mechanics: BTreeSet<&'static str>,
    /// Concatenated ability (or effect) text with keyword abilities and
    /// ability-name prefixes removed.
    pub ability_text: String,
    pub inkable: bool,
}

impl FeatureBundle {
    pub fn from_record(record: &CardRecord) -> Self {
        Self {
            ink_cost: record.cost.unwrap_or(0),
            strength: record.strength.unwrap_or(0),
            willpower: record.willpower.unwrap_or(0),
            lore: record.lore.unwrap_or(0),
            color: record.color.single(),
            card_type: record.card_type,
            tags: record.subtypes.iter().cloned().collect(),
            mechanics: find_mechanics(record),
            ability_text: ability_text(record),
            inkable: record.inkwell,
        }
    }

    pub fn has_ability_text(&self) -> bool {
        !self.ability_text.trim().is_empty()
    }
}

/// The text fed to the embedding model.
pub fn ability_text(record: &CardRecord) -> String {
    if record.is_action() {
        return record.effects.join(" ");
    }

    let mut parts = Vec::with_capacity(record.abilities.len());
    for ability in &record.abilities {
        if ability.kind.is_keyword() {
            continue;
        }
        parts.push(strip_ability_name(&ability.full_text, &ability.name));
    }
    parts.join(" ")
}

/// Removes a leading copy of the ability's own name (and a following
/// em-dash) from its full text.
fn strip_ability_name(full_text: &str, name: &str) -> String {
    if name.is_empty() {
        return full_text.to_string();
    }
    match full_text.strip_prefix(name) {
        Some(rest) => rest.trim().trim_start_matches('—').trim().to_string(),
        None => full_text.to_string(),
    }
}

fn push_terms(text: &str, mechanics: &mut BTreeSet<&'static str>) {
    let lower = text.to_lowercase();
    mechanics.extend(
        MECHANIC_KEYWORDS
            .iter()
            .copied()
            .filter(|keyword| lower.contains(keyword)),
    );
}

/// Vocabulary terms found in the card's effect/ability text or keyword
/// fields. Each term appears at most once.
pub fn find_mechanics(record: &CardRecord) -> BTreeSet<&'static str> {
    let mut mechanics = BTreeSet::new();

    if record.is_action() {
        for effect in &record.effects {
            push_terms(effect, &mut mechanics);
        }
        return mechanics;
    }

    for ability in &record.abilities {
        let keyword = ability.keyword.trim().to_lowercase();
        if let Some(term) = MECHANIC_KEYWORDS.iter().find(|term| **term == keyword) {
            mechanics.insert(*term);
        }
        if !ability.full_text.is_empty() {
            push_terms(&ability.full_text, &mut mechanics);
        }
    }
    mechanics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRecordBuilder;
    use crate::color::{InkColor, InkSet};

    #[test]
    fn action_text_comes_from_effects() {
        let record = CardRecordBuilder::new("Be Prepared")
            .card_type(CardType::Action)
            .effect("Banish all characters.")
            .effect("Draw a card.")
            .build();
        let bundle = FeatureBundle::from_record(&record);
        assert_eq!(bundle.ability_text, "Banish all characters. Draw a card.");
        assert!(bundle.mechanics.contains("banish"));
        assert!(bundle.mechanics.contains("draw"));
    }

    #[test]
    fn keyword_abilities_are_excluded_from_text_but_counted_as_mechanics() {
        let record = CardRecordBuilder::new("Goofy - Daredevil")
            .card_type(CardType::Character)
            .keyword("Evasive")
            .ability("GROUNDED", "This character can't challenge.")
            .build();
        let bundle = FeatureBundle::from_record(&record);
        assert_eq!(bundle.ability_text, "This character can't challenge.");
        assert!(bundle.mechanics.contains("evasive"));
    }

    #[test]
    fn ability_name_and_dash_are_stripped() {
        assert_eq!(
            strip_ability_name("WELL OF SOULS — Return a character card.", "WELL OF SOULS"),
            "Return a character card."
        );
        assert_eq!(
            strip_ability_name("Other text first.", "WELL OF SOULS"),
            "Other text first."
        );
    }

    #[test]
    fn mechanics_have_set_semantics() {
        let record = CardRecordBuilder::new("Healer")
            .ability("", "Remove up to 2 damage. Remove up to 2 damage again.")
            .build();
        let mechanics = find_mechanics(&record);
        assert_eq!(
            mechanics.into_iter().collect::<Vec<_>>(),
            vec!["damage", "remove"]
        );
    }

    #[test]
    fn missing_stats_default_to_zero() {
        let record = CardRecordBuilder::new("Lantern")
            .card_type(CardType::Item)
            .color(InkColor::Amber)
            .cost(2)
            .build();
        let bundle = FeatureBundle::from_record(&record);
        assert_eq!((bundle.strength, bundle.willpower, bundle.lore), (0, 0, 0));
        assert_eq!(bundle.color, Some(InkColor::Amber));
        assert!(!bundle.has_ability_text());
    }

    #[test]
    fn bundle_serializes_color_and_type_by_name() {
        let record = CardRecordBuilder::new("Maleficent - Sorceress")
            .card_type(CardType::Character)
            .color(InkColor::Amethyst)
            .subtypes(["Villain"])
            .ability("CAST MY SPELL!", "When you play this character, you may draw a card.")
            .build();
        let json = serde_json::to_value(FeatureBundle::from_record(&record)).unwrap();
        assert_eq!(json["color"], "Amethyst");
        assert_eq!(json["card_type"], "Character");
        assert_eq!(json["tags"], serde_json::json!(["Villain"]));
        assert_eq!(json["mechanics"], serde_json::json!(["draw"]));

        let dual = CardRecordBuilder::new("Jetsam - Opportunistic Eel")
            .color(InkSet::from(InkColor::Ruby).with(InkColor::Steel))
            .build();
        let json = serde_json::to_value(FeatureBundle::from_record(&dual)).unwrap();
        assert!(json["color"].is_null());
    }
}
