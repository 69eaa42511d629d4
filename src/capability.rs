//! Optional companion modules.
//!
//! A companion (for example the extension that owns on-use effects) may or may
//! not be loaded next to this one. Availability is probed once, cached, and
//! passed around as a value; callers branch on `is_available()` instead of
//! attempting a call and interpreting the failure.

use crate::handle::RuntimeHandle;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::info;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// A companion module that may be absent at runtime.
pub trait Capability {
    fn name(&self) -> &str;

    /// Detect the companion. `CachedCapability` calls this at most once.
    fn probe(&self) -> Availability;
}

/// Companion that binds created items to the effect they trigger on use.
pub trait EffectLinker: Capability {
    fn link_effect(
        &self,
        identifier: &str,
        effect: &str,
        handle: &RuntimeHandle,
    ) -> Result<(), String>;
}

/// A capability whose probe result is computed on first use and then reused.
pub struct CachedCapability<C> {
    inner: C,
    availability: OnceLock<Availability>,
}

impl<C: Capability> CachedCapability<C> {
    pub fn new(inner: C) -> Self {
        CachedCapability {
            inner,
            availability: OnceLock::new(),
        }
    }

    pub fn availability(&self) -> &Availability {
        self.availability.get_or_init(|| {
            let availability = self.inner.probe();
            info!(capability = self.inner.name(), ?availability, "probed companion");
            availability
        })
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }

    /// The companion, only when the probe found it.
    pub fn get(&self) -> Option<&C> {
        self.is_available().then_some(&self.inner)
    }

    /// The wrapped probe, whatever it reported.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}
