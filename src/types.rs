use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardType {
    Character,
    Action,
    Item,
    Location,
}

impl CardType {
    pub const ALL: [CardType; 4] = [
        CardType::Character,
        CardType::Action,
        CardType::Item,
        CardType::Location,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CardType::Character => "Character",
            CardType::Action => "Action",
            CardType::Item => "Item",
            CardType::Location => "Location",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|card_type| card_type.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CardType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Lenient `type` field reader: values outside the enumeration become `None`
/// instead of failing the whole catalog.
pub(crate) fn deserialize_card_type<'de, D>(deserializer: D) -> Result<Option<CardType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(CardType::from_name))
}

/// Ability kinds as they appear in the catalog's `abilities[].type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AbilityKind {
    Keyword,
    Triggered,
    Activated,
    Static,
    #[default]
    Other,
}

impl AbilityKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "keyword" => AbilityKind::Keyword,
            "triggered" => AbilityKind::Triggered,
            "activated" => AbilityKind::Activated,
            "static" => AbilityKind::Static,
            _ => AbilityKind::Other,
        }
    }

    pub fn is_keyword(self) -> bool {
        self == AbilityKind::Keyword
    }
}

impl<'de> Deserialize<'de> for AbilityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(AbilityKind::from_name).unwrap_or_default())
    }
}
