//! Item definitions: identity types, the typed model and its validation.
//!
//! `ItemDefinition` is what extensions register. `ItemKey` is the folded form
//! the registry indexes by; `Category` and `BehaviorFlags` are the enumerated
//! parts of the document schema.

pub mod identity;
pub mod model;
pub mod validation;

pub use identity::{BehaviorFlags, Category, ItemKey, ItemType};
pub use model::{AssetSource, ItemDefinition};
