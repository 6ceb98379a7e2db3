use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InkColor {
    Amber,
    Amethyst,
    Emerald,
    Ruby,
    Sapphire,
    Steel,
}

impl InkColor {
    /// Palette order. Also the tie-break order wherever colors are ranked.
    pub const ALL: [InkColor; 6] = [
        InkColor::Amber,
        InkColor::Amethyst,
        InkColor::Emerald,
        InkColor::Ruby,
        InkColor::Sapphire,
        InkColor::Steel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InkColor::Amber => "Amber",
            InkColor::Amethyst => "Amethyst",
            InkColor::Emerald => "Emerald",
            InkColor::Ruby => "Ruby",
            InkColor::Sapphire => "Sapphire",
            InkColor::Steel => "Steel",
        }
    }

    /// Parses a single ink name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(name))
    }

    const fn bit(self) -> u8 {
        match self {
            InkColor::Amber => 1 << 0,
            InkColor::Amethyst => 1 << 1,
            InkColor::Emerald => 1 << 2,
            InkColor::Ruby => 1 << 3,
            InkColor::Sapphire => 1 << 4,
            InkColor::Steel => 1 << 5,
        }
    }
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for InkColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// A set of ink colors represented as bitflags.
///
/// Dual-ink cards carry two colors; a deck's color identity is also an
/// `InkSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InkSet(u8);

impl InkSet {
    pub const EMPTY: Self = Self(0);

    /// Creates a new empty InkSet.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Creates an InkSet from a single color.
    pub const fn from_color(color: InkColor) -> Self {
        Self(color.bit())
    }

    /// Parses the catalog `color` field: one ink name, or several joined
    /// with `-` or `/`. Unknown names are ignored.
    pub fn parse(raw: &str) -> Self {
        raw.split(['-', '/'])
            .filter_map(InkColor::from_name)
            .collect()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, color: InkColor) -> bool {
        self.0 & color.bit() != 0
    }

    /// Returns true if this set contains all colors in the other set.
    pub const fn contains_all(self, other: InkSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Adds a color to this set, returning the new set.
    pub const fn with(self, color: InkColor) -> Self {
        Self(self.0 | color.bit())
    }

    /// The color of a mono-ink set; `None` for empty or dual-ink sets.
    pub fn single(self) -> Option<InkColor> {
        if self.count() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Iterates the colors in palette order.
    pub fn iter(self) -> impl Iterator<Item = InkColor> {
        InkColor::ALL
            .into_iter()
            .filter(move |color| self.contains(*color))
    }
}

impl From<InkColor> for InkSet {
    fn from(color: InkColor) -> Self {
        Self::from_color(color)
    }
}

impl FromIterator<InkColor> for InkSet {
    fn from_iter<T: IntoIterator<Item = InkColor>>(iter: T) -> Self {
        iter.into_iter().fold(InkSet::EMPTY, |set, color| set.with(color))
    }
}

impl fmt::Display for InkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(InkColor::name).collect();
        f.write_str(&names.join("-"))
    }
}

impl Serialize for InkSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InkSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(InkSet::parse).unwrap_or_default())
    }
}
