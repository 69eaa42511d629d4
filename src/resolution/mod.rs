//! Resolution of registered definitions into host runtime objects.
//!
//! `provider` defines the host seams, `icon` the icon lookup order,
//! `properties` the data copied onto created objects and `pipeline` the batch
//! driver. `offline` holds filesystem/dry-run stand-ins for the host.

pub mod icon;
pub mod offline;
pub mod pipeline;
pub mod properties;
pub mod provider;

pub use icon::{IconCandidate, IconSource, icon_candidates, resolve_icon};
pub use offline::{DirectoryAssets, DryRunFactory};
pub use pipeline::{CreationRoute, ResolutionPipeline, ResolutionSummary, ResolvedItem};
pub use properties::{ObjectProperties, apply_shared_properties};
pub use provider::{AssetProvider, CreatedObject, DisplayConfig, ObjectOrigin, RuntimeFactory};
