//! Shared fixtures for unit tests.

use crate::card::CardRecordBuilder;
use crate::catalog::Catalog;
use crate::color::{InkColor, InkSet};
use crate::types::CardType;

/// A small catalog spanning every card type, a dual-ink card, a card with no
/// ability text and two near-identical draw characters.
pub(crate) fn fixture_catalog() -> Catalog {
    Catalog::from_records(vec![
        CardRecordBuilder::new("Mickey Mouse - Brave Little Tailor")
            .card_type(CardType::Character)
            .cost(8)
            .stats(5, 5, 4)
            .color(InkColor::Amber)
            .subtypes(["Storyborn", "Hero", "Prince"])
            .keyword("Evasive")
            .ability(
                "STRAIGHT SHOOTER",
                "When you play this character, you may draw a card.",
            )
            .inkwell(false)
            .build(),
        CardRecordBuilder::new("Minnie Mouse - Wide-Eyed Diver")
            .card_type(CardType::Character)
            .cost(7)
            .stats(4, 5, 3)
            .color(InkColor::Amber)
            .subtypes(["Storyborn", "Hero"])
            .ability(
                "UNDERSEA ADVENTURE",
                "Whenever you play this character, you may draw a card.",
            )
            .inkwell(false)
            .build(),
        CardRecordBuilder::new("Stitch - Rock Star")
            .card_type(CardType::Character)
            .cost(6)
            .stats(3, 5, 3)
            .color(InkColor::Amber)
            .subtypes(["Floodborn", "Hero", "Alien"])
            .keyword("Shift")
            .ability(
                "ADORING FANS",
                "Whenever you play a character with cost 2 or less, you may exert them to draw a card.",
            )
            .inkwell(true)
            .build(),
        CardRecordBuilder::new("Maleficent - Sorceress")
            .card_type(CardType::Character)
            .cost(3)
            .stats(2, 2, 2)
            .color(InkColor::Amethyst)
            .subtypes(["Storyborn", "Villain", "Sorcerer"])
            .ability(
                "CAST MY SPELL!",
                "When you play this character, you may draw a card.",
            )
            .inkwell(true)
            .build(),
        CardRecordBuilder::new("Fire the Cannons!")
            .card_type(CardType::Action)
            .cost(1)
            .color(InkColor::Ruby)
            .effect("Deal 2 damage to chosen character.")
            .inkwell(true)
            .build(),
        CardRecordBuilder::new("Dinglehopper")
            .card_type(CardType::Item)
            .cost(1)
            .color(InkColor::Amber)
            .inkwell(true)
            .build(),
        CardRecordBuilder::new("Jetsam - Opportunistic Eel")
            .card_type(CardType::Character)
            .cost(4)
            .stats(3, 3, 1)
            .color(InkSet::from(InkColor::Ruby).with(InkColor::Steel))
            .subtypes(["Storyborn", "Ally"])
            .keyword("Rush")
            .inkwell(true)
            .build(),
        CardRecordBuilder::new("Belle's House - Maurice's Workshop")
            .card_type(CardType::Location)
            .cost(1)
            .color(InkColor::Amber)
            .ability(
                "LABORATORY",
                "If you have a character here, you pay 1 {I} less to play items.",
            )
            .inkwell(false)
            .build(),
    ])
}
