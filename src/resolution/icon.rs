//! Icon lookup order.
//!
//! Candidates are tried in a fixed order and the first hit wins: the icon a
//! bundle declares, then `Icon` as a `bundle:asset` reference, then `Icon` as an
//! external file, then `Icon` as an embedded resource. Every step is best
//! effort; running out of candidates leaves the item without an icon.

use crate::definition::ItemDefinition;
use crate::handle::ImageHandle;
use crate::resolution::provider::AssetProvider;
use serde::Serialize;
use std::path::Path;

/// Extension appended to embedded icon names that have none.
pub const EMBEDDED_IMAGE_EXTENSION: &str = "png";

/// Which candidate produced an icon.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSource {
    BundleIcon,
    BundleReference,
    ExternalFile,
    Embedded,
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// One place an icon may be found.
pub enum IconCandidate {
    BundleIcon { bundle: String, sprite: String },
    BundleReference { bundle: String, sprite: String },
    ExternalFile(String),
    Embedded(String),
}

impl IconCandidate {
    pub fn source(&self) -> IconSource {
        match self {
            IconCandidate::BundleIcon { .. } => IconSource::BundleIcon,
            IconCandidate::BundleReference { .. } => IconSource::BundleReference,
            IconCandidate::ExternalFile(_) => IconSource::ExternalFile,
            IconCandidate::Embedded(_) => IconSource::Embedded,
        }
    }

    fn load(&self, assets: &dyn AssetProvider) -> Option<ImageHandle> {
        match self {
            IconCandidate::BundleIcon { bundle, sprite }
            | IconCandidate::BundleReference { bundle, sprite } => {
                assets.find_sprite(bundle, sprite)
            }
            IconCandidate::ExternalFile(path) => assets.load_external_image(path),
            IconCandidate::Embedded(name) => assets.load_embedded_image(name),
        }
    }
}

/// Icon candidates for `definition`, in lookup order.
pub fn icon_candidates(definition: &ItemDefinition) -> Vec<IconCandidate> {
    let mut candidates = Vec::new();
    if let Some(source) = &definition.asset_source {
        if let Some(icon) = &source.icon {
            candidates.push(IconCandidate::BundleIcon {
                bundle: source.bundle.clone(),
                sprite: icon.clone(),
            });
        }
    }

    let Some(icon) = definition.icon_source.as_deref() else {
        return candidates;
    };
    if let Some((bundle, sprite)) = icon.split_once(':') {
        let (bundle, sprite) = (bundle.trim(), sprite.trim());
        if !bundle.is_empty() && !sprite.is_empty() {
            candidates.push(IconCandidate::BundleReference {
                bundle: bundle.to_string(),
                sprite: sprite.to_string(),
            });
        }
    }
    candidates.push(IconCandidate::ExternalFile(icon.to_string()));
    candidates.push(IconCandidate::Embedded(embedded_name(icon)));
    candidates
}

/// First icon any candidate yields, with the candidate kind that found it.
pub fn resolve_icon(
    definition: &ItemDefinition,
    assets: &dyn AssetProvider,
) -> Option<(ImageHandle, IconSource)> {
    icon_candidates(definition)
        .into_iter()
        .find_map(|candidate| candidate.load(assets).map(|icon| (icon, candidate.source())))
}

fn embedded_name(icon: &str) -> String {
    if Path::new(icon).extension().is_some() {
        icon.to_string()
    } else {
        format!("{icon}.{EMBEDDED_IMAGE_EXTENSION}")
    }
}
