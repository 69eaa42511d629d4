//! Seams to the host environment.
//!
//! The pipeline never touches engine objects directly: it asks an
//! `AssetProvider` for named assets and images and a `RuntimeFactory` for the
//! objects themselves. All calls are synchronous and local.

use crate::definition::ItemDefinition;
use crate::error::FactoryError;
use crate::handle::{AssetHandle, ImageHandle, RuntimeHandle};
use crate::resolution::properties::ObjectProperties;

/// Supplies named binary assets. Every lookup answers `None` when absent.
pub trait AssetProvider {
    /// An asset (typically a prefab) inside a named bundle.
    fn find_asset(&self, bundle: &str, asset: &str) -> Option<AssetHandle>;

    /// An image inside a named bundle.
    fn find_sprite(&self, bundle: &str, sprite: &str) -> Option<ImageHandle>;

    /// An image file supplied next to the item documents.
    fn load_external_image(&self, path: &str) -> Option<ImageHandle>;

    /// An image shipped inside the extension itself.
    fn load_embedded_image(&self, name: &str) -> Option<ImageHandle>;
}

/// Presentation data handed to the factory at creation time.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub display_key: String,
    pub description_key: String,
    pub icon: Option<ImageHandle>,
}

impl DisplayConfig {
    pub fn for_definition(definition: &ItemDefinition) -> Self {
        DisplayConfig {
            display_key: definition.display_key.clone(),
            description_key: definition.description_key.clone(),
            icon: definition.icon.clone(),
        }
    }
}

/// Where a created object was copied from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectOrigin {
    Asset(AssetHandle),
    Baseline(String),
}

/// An object the factory instantiated but has not yet handed to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedObject {
    pub identifier: String,
    pub origin: ObjectOrigin,
    /// Whether the object carries the drop/stack component every item needs.
    pub has_drop_component: bool,
    pub properties: ObjectProperties,
}

impl CreatedObject {
    pub fn new(identifier: impl Into<String>, origin: ObjectOrigin) -> Self {
        CreatedObject {
            identifier: identifier.into(),
            origin,
            has_drop_component: true,
            properties: ObjectProperties::default(),
        }
    }

    pub fn is_structurally_valid(&self) -> bool {
        self.has_drop_component
    }
}

/// Turns resolved descriptions into engine-visible objects.
pub trait RuntimeFactory {
    /// Copy an existing host item under a new identifier.
    fn create_from_baseline(
        &self,
        identifier: &str,
        baseline: &str,
        display: &DisplayConfig,
    ) -> Result<CreatedObject, FactoryError>;

    /// Instantiate a private copy of a bundle asset.
    fn create_from_asset(
        &self,
        identifier: &str,
        asset: &AssetHandle,
        display: &DisplayConfig,
    ) -> Result<CreatedObject, FactoryError>;

    /// Hand a fully configured object to the host and get its handle back.
    fn commit(&self, object: CreatedObject) -> Result<RuntimeHandle, FactoryError>;
}
