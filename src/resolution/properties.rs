//! Item properties copied onto every created object, whichever path made it.

use crate::definition::{ItemDefinition, ItemType};
use crate::handle::ImageHandle;
use crate::resolution::provider::CreatedObject;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
/// Host-facing item data. `restricted` stands in for whatever mechanism the
/// host uses to block trading.
pub struct ObjectProperties {
    pub display_key: String,
    pub description_key: String,
    pub weight: f64,
    pub max_stack: i64,
    pub value: i64,
    pub teleportable: bool,
    pub item_type: ItemType,
    pub restricted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageHandle>,
}

impl ObjectProperties {
    pub fn from_definition(definition: &ItemDefinition) -> Self {
        ObjectProperties {
            display_key: definition.display_key.clone(),
            description_key: definition.description_key.clone(),
            weight: definition.weight,
            max_stack: definition.max_stack,
            value: definition.value,
            teleportable: definition.teleportable,
            item_type: definition.item_type(),
            restricted: definition.is_restricted(),
            icon: definition.icon.clone(),
        }
    }
}

/// Overwrite the shared properties of `object` with those of `definition`.
pub fn apply_shared_properties(object: &mut CreatedObject, definition: &ItemDefinition) {
    object.properties = ObjectProperties::from_definition(definition);
}
