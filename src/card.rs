use serde::{Deserialize, Deserializer, Serialize};

use crate::color::InkSet;
use crate::names::sanitize_name;
use crate::types::{AbilityKind, CardType, deserialize_card_type};

/// One entry of a card's `abilities` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CardAbility {
    #[serde(rename = "type", default)]
    pub kind: AbilityKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(rename = "fullText", default)]
    pub full_text: String,
    #[serde(default)]
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Immutable catalog entry, as read from the card database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    #[serde(rename = "simpleName", default)]
    pub simple_name: String,
    #[serde(default)]
    pub cost: Option<i32>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_card_type"
    )]
    pub card_type: Option<CardType>,
    #[serde(default)]
    pub strength: Option<i32>,
    #[serde(default)]
    pub willpower: Option<i32>,
    #[serde(default)]
    pub lore: Option<i32>,
    #[serde(default)]
    pub color: InkSet,
    #[serde(default)]
    pub subtypes: Vec<String>,
    #[serde(default, skip_serializing)]
    pub abilities: Vec<CardAbility>,
    #[serde(default, skip_serializing)]
    pub effects: Vec<String>,
    #[serde(rename = "fullText", default)]
    pub full_text: String,
    #[serde(default)]
    pub inkwell: bool,
    #[serde(default)]
    pub rarity: String,
    #[serde(rename = "setCode", default, deserialize_with = "string_or_number")]
    pub set_code: String,
    #[serde(default)]
    pub images: CardImages,
    /// Present on enchanted reprints; such records never enter the catalog.
    #[serde(rename = "enchantedId", default, skip_serializing)]
    pub enchanted_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Sanitized simple name, filled in by the catalog.
    #[serde(skip)]
    pub(crate) key: String,
}

impl CardRecord {
    /// Canonical lookup key (sanitized simple name).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_enchanted(&self) -> bool {
        self.enchanted_id.is_some()
    }

    pub fn is_promotional(&self) -> bool {
        self.rarity.trim().eq_ignore_ascii_case("promotional")
    }

    pub fn is_variant(&self) -> bool {
        self.variant.is_some()
    }

    pub fn is_action(&self) -> bool {
        self.card_type == Some(CardType::Action)
    }

    pub(crate) fn assign_key(&mut self) {
        let source = if self.simple_name.trim().is_empty() {
            &self.full_name
        } else {
            &self.simple_name
        };
        self.key = sanitize_name(source);
    }
}

/// Builder for catalog records, mainly for fixtures and embedders that
/// assemble catalogs in code.
#[derive(Debug, Clone, Default)]
pub struct CardRecordBuilder {
    record: CardRecord,
}

impl CardRecordBuilder {
    pub fn new(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        Self {
            record: CardRecord {
                simple_name: sanitize_name(&full_name),
                full_name,
                ..Default::default()
            },
        }
    }

    /// Overrides the simple name derived from the full name.
    pub fn simple_name(mut self, simple_name: impl Into<String>) -> Self {
        self.record.simple_name = simple_name.into();
        self
    }

    pub fn card_type(mut self, card_type: CardType) -> Self {
        self.record.card_type = Some(card_type);
        self
    }

    pub fn cost(mut self, cost: i32) -> Self {
        self.record.cost = Some(cost);
        self
    }

    pub fn stats(mut self, strength: i32, willpower: i32, lore: i32) -> Self {
        self.record.strength = Some(strength);
        self.record.willpower = Some(willpower);
        self.record.lore = Some(lore);
        self
    }

    pub fn color(mut self, color: impl Into<InkSet>) -> Self {
        self.record.color = color.into();
        self
    }

    pub fn subtypes<I, S>(mut self, subtypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.subtypes = subtypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.record.abilities.push(CardAbility {
            kind: AbilityKind::Keyword,
            full_text: keyword.clone(),
            keyword,
            ..Default::default()
        });
        self
    }

    /// Adds a named ability; `text` is the ability's text without its name.
    pub fn ability(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let text = text.into();
        let full_text = if name.is_empty() {
            text.clone()
        } else {
            format!("{name} {text}")
        };
        self.record.abilities.push(CardAbility {
            kind: AbilityKind::Triggered,
            name,
            full_text,
            effect: text,
            ..Default::default()
        });
        self
    }

    pub fn effect(mut self, text: impl Into<String>) -> Self {
        self.record.effects.push(text.into());
        self
    }

    pub fn inkwell(mut self, inkwell: bool) -> Self {
        self.record.inkwell = inkwell;
        self
    }

    pub fn rarity(mut self, rarity: impl Into<String>) -> Self {
        self.record.rarity = rarity.into();
        self
    }

    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.record.variant = Some(variant.into());
        self
    }

    pub fn enchanted_id(mut self, id: i64) -> Self {
        self.record.enchanted_id = Some(id);
        self
    }

    pub fn build(self) -> CardRecord {
        let mut record = self.record;
        record.assign_key();
        record
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::InkColor;

    #[test]
    fn test_record_deserializes_lorcana_fields() {
        let raw = r#"{
            "fullName": "Stitch - Rock Star",
            "simpleName": "stitch rock star",
            "cost": 6,
            "type": "Character",
            "strength": 3,
            "willpower": 5,
            "lore": 3,
            "color": "Amber",
            "subtypes": ["Floodborn", "Hero", "Alien"],
            "abilities": [
                {"type": "keyword", "keyword": "Shift", "fullText": "Shift 4"},
                {"type": "triggered", "name": "ADORING FANS", "fullText": "ADORING FANS Whenever you play a character with cost 2 or less, you may exert them to draw a card."}
            ],
            "inkwell": true,
            "rarity": "Legendary",
            "setCode": 1
        }"#;
        let mut record: CardRecord = serde_json::from_str(raw).unwrap();
        record.assign_key();
        assert_eq!(record.key(), "stitch rock star");
        assert_eq!(record.card_type, Some(CardType::Character));
        assert_eq!(record.color.single(), Some(InkColor::Amber));
        assert_eq!(record.set_code, "1");
        assert_eq!(record.abilities.len(), 2);
        assert!(record.abilities[0].kind.is_keyword());
        assert!(!record.is_variant());
        assert!(!record.is_enchanted());
    }

    #[test]
    fn test_unknown_type_is_kept_as_none() {
        let record: CardRecord =
            serde_json::from_str(r#"{"fullName": "Mystery", "type": "Song"}"#).unwrap();
        assert_eq!(record.card_type, None);
    }

    #[test]
    fn test_promotional_rarity_is_case_insensitive() {
        let record = CardRecordBuilder::new("Promo Card").rarity("PROMOTIONAL").build();
        assert!(record.is_promotional());
    }

    #[test]
    fn test_builder_assigns_sanitized_key() {
        let record = CardRecordBuilder::new("Hades - Lord of the Dead").build();
        assert_eq!(record.key(), "hades lord of the dead");
    }
}
