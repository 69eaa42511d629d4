use common_items::capability::{Availability, Capability, EffectLinker};
use common_items::{
    AssetHandle, AssetProvider, CreatedObject, DisplayConfig, FactoryError, ImageHandle,
    ObjectOrigin, RuntimeFactory, RuntimeHandle,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Asset provider answering from fixed tables and logging every lookup as
/// `kind:argument`.
#[derive(Default)]
pub struct FakeAssets {
    pub assets: BTreeSet<(String, String)>,
    pub sprites: BTreeSet<(String, String)>,
    pub external: BTreeSet<String>,
    pub embedded: BTreeSet<String>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeAssets {
    pub fn with_asset(mut self, bundle: &str, asset: &str) -> Self {
        self.assets.insert((bundle.to_string(), asset.to_string()));
        self
    }

    pub fn with_sprite(mut self, bundle: &str, sprite: &str) -> Self {
        self.sprites.insert((bundle.to_string(), sprite.to_string()));
        self
    }

    pub fn with_external(mut self, path: &str) -> Self {
        self.external.insert(path.to_string());
        self
    }

    pub fn with_embedded(mut self, name: &str) -> Self {
        self.embedded.insert(name.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn log(&self, entry: String) {
        self.lookups.lock().unwrap().push(entry);
    }
}

impl AssetProvider for FakeAssets {
    fn find_asset(&self, bundle: &str, asset: &str) -> Option<AssetHandle> {
        self.log(format!("asset:{bundle}/{asset}"));
        self.assets
            .contains(&(bundle.to_string(), asset.to_string()))
            .then(|| AssetHandle(format!("{bundle}/{asset}")))
    }

    fn find_sprite(&self, bundle: &str, sprite: &str) -> Option<ImageHandle> {
        self.log(format!("sprite:{bundle}/{sprite}"));
        self.sprites
            .contains(&(bundle.to_string(), sprite.to_string()))
            .then(|| ImageHandle(format!("{bundle}/{sprite}")))
    }

    fn load_external_image(&self, path: &str) -> Option<ImageHandle> {
        self.log(format!("external:{path}"));
        self.external
            .contains(path)
            .then(|| ImageHandle(format!("file:{path}")))
    }

    fn load_embedded_image(&self, name: &str) -> Option<ImageHandle> {
        self.log(format!("embedded:{name}"));
        self.embedded
            .contains(name)
            .then(|| ImageHandle(format!("embedded:{name}")))
    }
}

/// Factory that records creation calls and committed objects.
pub struct RecordingFactory {
    pub baselines: BTreeSet<String>,
    /// Assets that instantiate without a drop component.
    pub hollow_assets: BTreeSet<String>,
    pub failing_commits: BTreeSet<String>,
    pub creations: Mutex<BTreeMap<String, usize>>,
    pub committed: Mutex<Vec<CreatedObject>>,
}

impl RecordingFactory {
    pub fn new(baselines: &[&str]) -> Self {
        RecordingFactory {
            baselines: baselines.iter().map(|b| b.to_string()).collect(),
            hollow_assets: BTreeSet::new(),
            failing_commits: BTreeSet::new(),
            creations: Mutex::new(BTreeMap::new()),
            committed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_hollow_asset(mut self, asset: &str) -> Self {
        self.hollow_assets.insert(asset.to_string());
        self
    }

    pub fn with_failing_commit(mut self, identifier: &str) -> Self {
        self.failing_commits.insert(identifier.to_string());
        self
    }

    pub fn creations_for(&self, identifier: &str) -> usize {
        self.creations
            .lock()
            .unwrap()
            .get(identifier)
            .copied()
            .unwrap_or(0)
    }

    pub fn committed(&self, identifier: &str) -> Option<CreatedObject> {
        self.committed
            .lock()
            .unwrap()
            .iter()
            .find(|object| object.identifier == identifier)
            .cloned()
    }

    fn count(&self, identifier: &str) {
        *self
            .creations
            .lock()
            .unwrap()
            .entry(identifier.to_string())
            .or_insert(0) += 1;
    }
}

impl RuntimeFactory for RecordingFactory {
    fn create_from_baseline(
        &self,
        identifier: &str,
        baseline: &str,
        _display: &DisplayConfig,
    ) -> Result<CreatedObject, FactoryError> {
        self.count(identifier);
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
        self.count(identifier);
        let mut object = CreatedObject::new(identifier, ObjectOrigin::Asset(asset.clone()));
        object.has_drop_component = !self.hollow_assets.contains(&asset.0);
        Ok(object)
    }

    fn commit(&self, object: CreatedObject) -> Result<RuntimeHandle, FactoryError> {
        if self.failing_commits.contains(&object.identifier) {
            return Err(FactoryError::Host(format!(
                "host refused {}",
                object.identifier
            )));
        }
        let handle = RuntimeHandle(format!("rt:{}", object.identifier));
        self.committed.lock().unwrap().push(object);
        Ok(handle)
    }
}

/// Effect companion that records every link request.
pub struct FakeEffects {
    pub present: bool,
    pub links: Mutex<Vec<(String, String)>>,
}

impl FakeEffects {
    pub fn new(present: bool) -> Self {
        FakeEffects {
            present,
            links: Mutex::new(Vec::new()),
        }
    }

    pub fn links(&self) -> Vec<(String, String)> {
        self.links.lock().unwrap().clone()
    }
}

impl Capability for FakeEffects {
    fn name(&self) -> &str {
        "status-effects"
    }

    fn probe(&self) -> Availability {
        if self.present {
            Availability::Available
        } else {
            Availability::Unavailable("status effect companion not loaded".into())
        }
    }
}

impl EffectLinker for FakeEffects {
    fn link_effect(
        &self,
        identifier: &str,
        effect: &str,
        _handle: &RuntimeHandle,
    ) -> Result<(), String> {
        self.links
            .lock()
            .unwrap()
            .push((identifier.to_string(), effect.to_string()));
        Ok(())
    }
}
