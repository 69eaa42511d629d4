//! Host stand-ins for checking item documents outside the game.
//!
//! `DirectoryAssets` answers asset lookups from a directory tree laid out as
//! `bundles/<bundle>/<asset>`, `icons/<file>` and `embedded/<file>`.
//! `DryRunFactory` pretends to instantiate objects and knows a fixed set of
//! baselines, so a document can be resolved end to end without the engine.

use crate::definition::Category;
use crate::error::FactoryError;
use crate::handle::{AssetHandle, ImageHandle, RuntimeHandle};
use crate::resolution::provider::{
    AssetProvider, CreatedObject, DisplayConfig, ObjectOrigin, RuntimeFactory,
};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
/// Filesystem-backed asset provider rooted at one directory.
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root)
            .with_context(|| format!("Unable to canonicalize asset root {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` inside `dir`, by exact file name or by file stem.
    ///
    /// Results are canonicalized and must stay under the asset root, so names
    /// like `../secret` or symlinks pointing elsewhere never match.
    fn lookup(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let exact = dir.join(name);
        let candidate = if exact.is_file() {
            exact
        } else {
            fs::read_dir(dir)
                .ok()?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file())
                .find(|path| path.file_stem().and_then(|s| s.to_str()) == Some(name))?
        };
        let canonical = fs::canonicalize(candidate).ok()?;
        canonical.starts_with(&self.root).then_some(canonical)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn bundle_dir(&self, bundle: &str) -> PathBuf {
        self.root.join("bundles").join(bundle)
    }
}

impl AssetProvider for DirectoryAssets {
    fn find_asset(&self, bundle: &str, asset: &str) -> Option<AssetHandle> {
        self.lookup(&self.bundle_dir(bundle), asset)
            .map(|path| AssetHandle(self.relative(&path)))
    }

    fn find_sprite(&self, bundle: &str, sprite: &str) -> Option<ImageHandle> {
        self.lookup(&self.bundle_dir(bundle), sprite)
            .map(|path| ImageHandle(self.relative(&path)))
    }

    fn load_external_image(&self, path: &str) -> Option<ImageHandle> {
        self.lookup(&self.root.join("icons"), path)
            .map(|path| ImageHandle(self.relative(&path)))
    }

    fn load_embedded_image(&self, name: &str) -> Option<ImageHandle> {
        self.lookup(&self.root.join("embedded"), name)
            .map(|path| ImageHandle(self.relative(&path)))
    }
}

#[derive(Debug, Clone)]
/// Factory that validates baselines and produces descriptive handles.
pub struct DryRunFactory {
    baselines: BTreeSet<String>,
}

impl Default for DryRunFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunFactory {
    /// Knows every per-category default baseline.
    pub fn new() -> Self {
        DryRunFactory {
            baselines: Category::ALL
                .iter()
                .map(|category| category.default_baseline().to_string())
                .collect(),
        }
    }

    /// Add further host items that may be cloned.
    pub fn with_baselines<I, S>(mut self, baselines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baselines.extend(baselines.into_iter().map(Into::into));
        self
    }
}

impl RuntimeFactory for DryRunFactory {
    fn create_from_baseline(
        &self,
        identifier: &str,
        baseline: &str,
        _display: &DisplayConfig,
    ) -> Result<CreatedObject, FactoryError> {
        if !self.baselines.contains(baseline) {
            return Err(FactoryError::MissingBaseline(baseline.to_string()));
        }
        Ok(CreatedObject::new(
            identifier,
            ObjectOrigin::Baseline(baseline.to_string()),
        ))
    }

    fn create_from_asset(
        &self,
        identifier: &str,
        asset: &AssetHandle,
        _display: &DisplayConfig,
    ) -> Result<CreatedObject, FactoryError> {
        Ok(CreatedObject::new(
            identifier,
            ObjectOrigin::Asset(asset.clone()),
        ))
    }

    fn commit(&self, object: CreatedObject) -> Result<RuntimeHandle, FactoryError> {
        let origin = match &object.origin {
            ObjectOrigin::Asset(asset) => format!("asset:{asset}"),
            ObjectOrigin::Baseline(baseline) => format!("clone:{baseline}"),
        };
        Ok(RuntimeHandle(format!("{}@{origin}", object.identifier)))
    }
}
