//! Typed item definitions and their construction from parsed documents.
//!
//! Field names mirror the document schema (`PrefabName`, `MaxStack`, ...) but
//! use Rust naming. Construction from a document node is permissive: absent or
//! mistyped fields fall back to defaults, and only a missing `PrefabName` or a
//! non-object entry rejects the element.

use crate::definition::identity::{BehaviorFlags, Category, ItemKey, ItemType};
use crate::document::{Mapping, Node};
use crate::error::EntryError;
use crate::handle::ImageHandle;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Custom asset location. Presence selects the custom-asset strategy.
pub struct AssetSource {
    pub bundle: String,
    /// Asset to copy; defaults to the item identifier.
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Declarative description of one item.
pub struct ItemDefinition {
    pub identifier: String,
    pub display_key: String,
    pub description_key: String,
    pub category: Category,
    pub max_stack: i64,
    pub weight: f64,
    pub value: i64,
    pub tradeable: bool,
    pub teleportable: bool,
    pub consumable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_use_effect: Option<String>,
    pub flags: BehaviorFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_source: Option<AssetSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_source: Option<String>,
    /// Filled in by resolution, never by parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageHandle>,
}

impl ItemDefinition {
    /// A definition with every field at its document default.
    ///
    /// Extensions registering in code typically start here and override with
    /// struct update syntax.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        ItemDefinition {
            display_key: default_display_key(&identifier),
            description_key: default_description_key(&identifier),
            identifier,
            category: Category::Misc,
            max_stack: 1,
            weight: 1.0,
            value: 0,
            tradeable: true,
            teleportable: true,
            consumable: false,
            on_use_effect: None,
            flags: BehaviorFlags::empty(),
            asset_source: None,
            clone_baseline: None,
            icon_source: None,
            icon: None,
        }
    }

    /// Build a definition from one element of the `Items` list.
    pub fn from_node(node: &Node) -> Result<Self, EntryError> {
        let map = node.as_mapping().ok_or(EntryError::NotAnObject)?;
        let identifier = non_empty(map.get_str("PrefabName")).ok_or(EntryError::MissingIdentifier)?;

        let mut def = ItemDefinition::new(identifier);
        if let Some(display) = non_empty(map.get_str("DisplayName")) {
            def.display_key = display;
        }
        if let Some(description) = non_empty(map.get_str("Description")) {
            def.description_key = description;
        }
        if let Some(name) = map.get_str("Category") {
            match Category::from_name(name) {
                Some(category) => def.category = category,
                None => debug!(id = %def.identifier, category = name, "unknown category, using Misc"),
            }
        }
        def.max_stack = map.get_int("MaxStack", def.max_stack);
        def.weight = map.get_float("Weight", def.weight);
        def.value = map.get_int("Value", def.value);
        def.tradeable = map.get_bool("Tradeable", def.tradeable);
        def.teleportable = map.get_bool("Teleportable", def.teleportable);
        def.consumable = map.get_bool("Consumable", def.consumable);
        def.on_use_effect = non_empty(map.get_str("OnUseAbility"));
        def.flags = parse_flags(map, &def.identifier);
        def.clone_baseline = non_empty(map.get_str("CloneFrom"));
        def.icon_source = non_empty(map.get_str("Icon"));
        def.asset_source = non_empty(map.get_str("Bundle")).map(|bundle| AssetSource {
            bundle,
            asset: non_empty(map.get_str("BundlePrefab"))
                .unwrap_or_else(|| def.identifier.clone()),
            icon: non_empty(map.get_str("BundleIcon")),
        });
        Ok(def)
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.identifier)
    }

    /// Effect to trigger on use; only consumables carry one.
    pub fn effect_link(&self) -> Option<&str> {
        if self.consumable {
            self.on_use_effect.as_deref()
        } else {
            None
        }
    }

    /// Baseline cloned when no custom asset is used.
    pub fn baseline(&self) -> &str {
        self.clone_baseline
            .as_deref()
            .unwrap_or_else(|| self.category.default_baseline())
    }

    pub fn item_type(&self) -> ItemType {
        if self.consumable {
            ItemType::Consumable
        } else if self.category == Category::Trophy {
            ItemType::Trophy
        } else {
            ItemType::Material
        }
    }

    /// Whether the host must block trading of this item.
    pub fn is_restricted(&self) -> bool {
        !self.tradeable || self.flags.contains(BehaviorFlags::NO_TRADE)
    }
}

fn default_display_key(identifier: &str) -> String {
    format!("$item_{}", identifier.to_lowercase())
}

fn default_description_key(identifier: &str) -> String {
    format!("$item_{}_desc", identifier.to_lowercase())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_flags(map: &Mapping, identifier: &str) -> BehaviorFlags {
    let mut flags = BehaviorFlags::empty();
    for name in map.get_list("Flags").iter().filter_map(Node::as_str) {
        match BehaviorFlags::from_label(name) {
            Some(flag) => flags |= flag,
            None => debug!(id = identifier, flag = name, "ignoring unknown flag"),
        }
    }
    flags
}
