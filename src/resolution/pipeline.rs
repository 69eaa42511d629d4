//! Turns registered definitions into host objects, once each.
//!
//! For every definition the pipeline resolves an icon, picks a creation
//! strategy, creates the object, copies the shared properties onto it, commits
//! it through the factory and stores the handle in the registry. A definition
//! whose entry already holds a handle is skipped, which makes repeated batches
//! safe. A failing item is reported and skipped; the batch always completes.

use crate::capability::{CachedCapability, EffectLinker};
use crate::definition::{AssetSource, ItemDefinition};
use crate::error::{ResolutionFailure, ResolutionPhase};
use crate::handle::RuntimeHandle;
use crate::registry::Registry;
use crate::resolution::icon::{IconSource, resolve_icon};
use crate::resolution::properties::apply_shared_properties;
use crate::resolution::provider::{AssetProvider, CreatedObject, DisplayConfig, RuntimeFactory};
use serde::Serialize;
use std::borrow::Borrow;
use tracing::{debug, debug_span, info, warn};

/// How an item ended up being created.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationRoute {
    CustomAsset,
    Clone,
    /// A custom asset was declared but unusable; the clone path created it.
    CloneFallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// One item created by this batch.
pub struct ResolvedItem {
    pub id: String,
    pub route: CreationRoute,
    pub handle: RuntimeHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_source: Option<IconSource>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
/// Counts for one `resolve_all` batch.
pub struct ResolutionSummary {
    /// Items created by this batch, by either route.
    pub created: usize,
    pub from_custom_asset: usize,
    /// Includes the fallbacks.
    pub from_clone: usize,
    pub fallbacks: usize,
    pub already_resolved: usize,
    pub unregistered: usize,
    pub icons_resolved: usize,
    pub effects_linked: usize,
    pub effects_deferred: usize,
    pub items: Vec<ResolvedItem>,
    pub failures: Vec<ResolutionFailure>,
}

/// Resolution driver bound to one registry.
pub struct ResolutionPipeline<'r> {
    registry: &'r Registry,
    effects: Option<&'r dyn EffectLinker>,
}

impl<'r> ResolutionPipeline<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        ResolutionPipeline {
            registry,
            effects: None,
        }
    }

    /// Link on-use effects through `linker` when its companion is present.
    /// Without one, effect links are counted as deferred.
    pub fn with_effect_linker<C: EffectLinker + 'r>(
        mut self,
        linker: &'r CachedCapability<C>,
    ) -> Self {
        self.effects = linker.get().map(|inner| inner as &dyn EffectLinker);
        self
    }

    /// Resolve every registered entry that has no handle yet.
    pub fn resolve_registered(
        &self,
        assets: &dyn AssetProvider,
        factory: &dyn RuntimeFactory,
    ) -> ResolutionSummary {
        self.resolve_all(self.registry.unresolved(), assets, factory)
    }

    /// Resolve `definitions` against the registry.
    ///
    /// Definitions are matched to registry entries by identifier and the
    /// registered copy is what gets resolved; definitions that were never
    /// registered are skipped.
    pub fn resolve_all<I>(
        &self,
        definitions: I,
        assets: &dyn AssetProvider,
        factory: &dyn RuntimeFactory,
    ) -> ResolutionSummary
    where
        I: IntoIterator,
        I::Item: Borrow<ItemDefinition>,
    {
        let mut summary = ResolutionSummary::default();
        for definition in definitions {
            self.resolve_one(definition.borrow(), assets, factory, &mut summary);
        }
        info!(
            created = summary.created,
            from_custom_asset = summary.from_custom_asset,
            from_clone = summary.from_clone,
            fallbacks = summary.fallbacks,
            failed = summary.failures.len(),
            "resolution batch finished"
        );
        summary
    }

    fn resolve_one(
        &self,
        requested: &ItemDefinition,
        assets: &dyn AssetProvider,
        factory: &dyn RuntimeFactory,
        summary: &mut ResolutionSummary,
    ) {
        let _span = debug_span!("resolve", id = %requested.identifier).entered();
        let Some(entry) = self.registry.entry(&requested.identifier) else {
            warn!(id = %requested.identifier, "skipping unregistered definition");
            summary.unregistered += 1;
            return;
        };
        // Held until the handle is attached so concurrent batches create each
        // item at most once.
        let Some(claim) = self.registry.claim_resolution(&entry.definition.identifier) else {
            debug!("already resolved or being resolved");
            summary.already_resolved += 1;
            return;
        };

        let mut definition = ItemDefinition::clone(&claim.entry().definition);
        let mut icon_source = None;
        if definition.icon.is_none() {
            if let Some((icon, source)) = resolve_icon(&definition, assets) {
                debug!(icon = %icon, ?source, "resolved icon");
                self.registry.attach_icon(&definition.identifier, icon.clone());
                definition.icon = Some(icon);
                icon_source = Some(source);
                summary.icons_resolved += 1;
            }
        }

        let (object, route) = match create(&definition, assets, factory) {
            Ok(created) => created,
            Err(failure) => {
                warn!(id = %failure.id, phase = failure.phase.as_str(), "{}", failure.reason);
                summary.failures.push(failure);
                return;
            }
        };

        let handle = match commit(object, &definition, factory) {
            Ok(handle) => handle,
            Err(failure) => {
                warn!(id = %failure.id, phase = failure.phase.as_str(), "{}", failure.reason);
                summary.failures.push(failure);
                return;
            }
        };
        self.registry
            .attach_runtime_handle(&definition.identifier, handle.clone());

        summary.created += 1;
        match route {
            CreationRoute::CustomAsset => summary.from_custom_asset += 1,
            CreationRoute::Clone => summary.from_clone += 1,
            CreationRoute::CloneFallback => {
                summary.from_clone += 1;
                summary.fallbacks += 1;
            }
        }
        self.link_effect(&definition, &handle, summary);
        debug!(?route, handle = %handle, "created item");
        summary.items.push(ResolvedItem {
            id: definition.identifier,
            route,
            handle,
            icon_source,
        });
    }

    fn link_effect(
        &self,
        definition: &ItemDefinition,
        handle: &RuntimeHandle,
        summary: &mut ResolutionSummary,
    ) {
        let Some(effect) = definition.effect_link() else {
            return;
        };
        let Some(linker) = self.effects else {
            debug!(effect, "effect companion unavailable, link deferred");
            summary.effects_deferred += 1;
            return;
        };
        match linker.link_effect(&definition.identifier, effect, handle) {
            Ok(()) => summary.effects_linked += 1,
            Err(reason) => {
                warn!(id = %definition.identifier, effect, "effect link failed: {reason}");
                summary.effects_deferred += 1;
            }
        }
    }
}

/// Custom asset first when declared, clone otherwise or on any custom-asset
/// problem.
fn create(
    definition: &ItemDefinition,
    assets: &dyn AssetProvider,
    factory: &dyn RuntimeFactory,
) -> Result<(CreatedObject, CreationRoute), ResolutionFailure> {
    let display = DisplayConfig::for_definition(definition);
    let mut route = CreationRoute::Clone;

    if let Some(source) = &definition.asset_source {
        match create_from_bundle(definition, source, assets, factory, &display) {
            Ok(object) => return Ok((object, CreationRoute::CustomAsset)),
            Err(reason) => {
                info!(
                    id = %definition.identifier,
                    phase = ResolutionPhase::CustomAsset.as_str(),
                    baseline = definition.baseline(),
                    "custom asset unusable, cloning instead: {reason}"
                );
                route = CreationRoute::CloneFallback;
            }
        }
    }

    let baseline = definition.baseline();
    factory
        .create_from_baseline(&definition.identifier, baseline, &display)
        .map(|object| (object, route))
        .map_err(|err| ResolutionFailure {
            id: definition.identifier.clone(),
            phase: ResolutionPhase::Clone,
            reason: format!("cloning '{baseline}': {err}"),
        })
}

fn create_from_bundle(
    definition: &ItemDefinition,
    source: &AssetSource,
    assets: &dyn AssetProvider,
    factory: &dyn RuntimeFactory,
    display: &DisplayConfig,
) -> Result<CreatedObject, String> {
    let asset = assets.find_asset(&source.bundle, &source.asset).ok_or_else(|| {
        format!(
            "asset '{}' not found in bundle '{}'",
            source.asset, source.bundle
        )
    })?;
    let object = factory
        .create_from_asset(&definition.identifier, &asset, display)
        .map_err(|err| format!("instantiating '{asset}': {err}"))?;
    if !object.is_structurally_valid() {
        return Err(format!("asset '{asset}' has no drop component"));
    }
    Ok(object)
}

fn commit(
    mut object: CreatedObject,
    definition: &ItemDefinition,
    factory: &dyn RuntimeFactory,
) -> Result<RuntimeHandle, ResolutionFailure> {
    apply_shared_properties(&mut object, definition);
    factory.commit(object).map_err(|err| ResolutionFailure {
        id: definition.identifier.clone(),
        phase: ResolutionPhase::Commit,
        reason: err.to_string(),
    })
}
