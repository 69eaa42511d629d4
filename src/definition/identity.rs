use bitflags::bitflags;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Case-insensitive registry key for an item identifier.
///
/// Definitions keep the identifier as written; the registry stores and looks
/// up entries by this folded form so `Coins` and `coins` collide.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(identifier: &str) -> Self {
        ItemKey(identifier.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemKey {
    fn from(identifier: &str) -> Self {
        ItemKey::new(identifier)
    }
}

/// Item grouping used for filtering and for picking a clone baseline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Category {
    Currency,
    CraftingMaterial,
    Consumable,
    Rune,
    Scroll,
    Token,
    Trophy,
    QuestItem,
    #[default]
    Misc,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Currency,
        Category::CraftingMaterial,
        Category::Consumable,
        Category::Rune,
        Category::Scroll,
        Category::Token,
        Category::Trophy,
        Category::QuestItem,
        Category::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Currency => "Currency",
            Category::CraftingMaterial => "CraftingMaterial",
            Category::Consumable => "Consumable",
            Category::Rune => "Rune",
            Category::Scroll => "Scroll",
            Category::Token => "Token",
            Category::Trophy => "Trophy",
            Category::QuestItem => "QuestItem",
            Category::Misc => "Misc",
        }
    }

    /// Case-insensitive lookup by name; `None` for names outside the set.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
    }

    /// Host item cloned when a definition names neither a bundle asset nor an
    /// explicit baseline.
    pub fn default_baseline(&self) -> &'static str {
        match self {
            Category::Currency | Category::Token | Category::Misc => "Coins",
            Category::CraftingMaterial => "Resin",
            Category::Consumable => "MeadHealthMinor",
            Category::Rune | Category::QuestItem => "Ruby",
            Category::Scroll | Category::Trophy => "TrophyDeer",
        }
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Host-side item type written onto created objects.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum ItemType {
    #[default]
    Material,
    Consumable,
    Trophy,
}

bitflags! {
    /// Behavior restrictions. `SOULBOUND` and `QUEST` are unions of the
    /// primitive flags, never separate bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BehaviorFlags: u32 {
        const NO_DROP = 1 << 0;
        const NO_DESTROY = 1 << 1;
        const NO_TRADE = 1 << 2;
        const NO_STORE = 1 << 3;
        const HIDDEN = 1 << 4;
        const REFRESH_ON_STACK = 1 << 5;
        const AUTO_CONSUME = 1 << 6;

        const SOULBOUND = Self::NO_DROP.bits() | Self::NO_TRADE.bits();
        const QUEST = Self::NO_DROP.bits() | Self::NO_DESTROY.bits() | Self::NO_TRADE.bits();
    }
}

const PRIMITIVE_NAMES: [(&str, BehaviorFlags); 7] = [
    ("NoDrop", BehaviorFlags::NO_DROP),
    ("NoDestroy", BehaviorFlags::NO_DESTROY),
    ("NoTrade", BehaviorFlags::NO_TRADE),
    ("NoStore", BehaviorFlags::NO_STORE),
    ("Hidden", BehaviorFlags::HIDDEN),
    ("RefreshOnStack", BehaviorFlags::REFRESH_ON_STACK),
    ("AutoConsume", BehaviorFlags::AUTO_CONSUME),
];

const COMPOSITE_NAMES: [(&str, BehaviorFlags); 2] = [
    ("Soulbound", BehaviorFlags::SOULBOUND),
    ("Quest", BehaviorFlags::QUEST),
];

impl BehaviorFlags {
    /// Case-insensitive lookup of a primitive or composite flag name.
    pub fn from_label(name: &str) -> Option<Self> {
        let name = name.trim();
        PRIMITIVE_NAMES
            .iter()
            .chain(COMPOSITE_NAMES.iter())
            .find(|(label, _)| label.eq_ignore_ascii_case(name))
            .map(|(_, flags)| *flags)
    }

    /// Names of the primitive flags that are set, in declaration order.
    pub fn primitive_names(&self) -> Vec<&'static str> {
        PRIMITIVE_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(label, _)| *label)
            .collect()
    }
}

impl Serialize for BehaviorFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let names = self.primitive_names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}
