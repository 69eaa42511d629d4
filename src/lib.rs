//! Shared item catalogue for game extensions.
//!
//! Extensions describe items in JSON-shaped documents. The crate parses those
//! documents with its own scanner (`document`), turns each entry into a typed
//! `ItemDefinition` (`definition`), stores it in a concurrency-safe `Registry`
//! and later resolves every registered definition into a host object through
//! the `resolution` pipeline. The host engine is reached only through the
//! `AssetProvider` and `RuntimeFactory` traits, so the whole flow can run
//! offline against `DirectoryAssets` and `DryRunFactory` (see `item-check`).
//!
//! Nothing here is global: callers build one `Registry` and lend it to the
//! `IngestionDriver`, the `ResolutionPipeline` and the currency `Ledger`.

pub mod capability;
pub mod config;
pub mod definition;
pub mod document;
pub mod error;
pub mod handle;
pub mod ingest;
pub mod ledger;
pub mod registry;
pub mod resolution;

pub use capability::{Availability, CachedCapability, Capability, EffectLinker};
pub use config::{DocumentSource, IngestConfig};
pub use definition::{AssetSource, BehaviorFlags, Category, ItemDefinition, ItemKey, ItemType};
pub use error::{
    EntryError, FactoryError, ParseError, QueryError, RegisterError, ResolutionFailure,
    ResolutionPhase, ValidationError,
};
pub use handle::{AssetHandle, ImageHandle, RuntimeHandle};
pub use ingest::{DocumentReport, IngestSummary, IngestionDriver, parse_definitions};
pub use ledger::{Inventory, Ledger, MemoryInventory};
pub use registry::{Registry, RegistryEntry, ResolutionClaim};
pub use resolution::{
    AssetProvider, CreatedObject, CreationRoute, DirectoryAssets, DisplayConfig, DryRunFactory,
    ObjectOrigin, ResolutionPipeline, ResolutionSummary, RuntimeFactory,
};
