//! Structural checks a definition must pass before registration.

use crate::definition::ItemDefinition;
use crate::error::ValidationError;

impl ItemDefinition {
    /// Check the structural invariants. Pure; safe to call any number of times.
    ///
    /// A consumable without an effect is valid; it simply links to nothing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.identifier.trim().is_empty() {
            return Err(ValidationError::BlankIdentifier);
        }
        if self.max_stack < 1 {
            return Err(ValidationError::MaxStackTooSmall(self.max_stack));
        }
        // NaN fails the `>= 0` comparison and is rejected with the negatives.
        if !(self.weight >= 0.0) {
            return Err(ValidationError::NegativeWeight(self.weight));
        }
        if self.value < 0 {
            return Err(ValidationError::NegativeValue(self.value));
        }
        Ok(())
    }
}
