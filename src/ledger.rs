//! Currency queries against a player's inventory.
//!
//! The inventory itself belongs to the host; `Inventory` is the narrow view the
//! ledger needs. Only registered items in the `Currency` or `Token` category
//! count as currency.

use crate::definition::{Category, ItemDefinition, ItemKey};
use crate::error::QueryError;
use crate::registry::Registry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stack counts held by one player.
pub trait Inventory {
    fn count(&self, identifier: &str) -> u32;

    /// Returns the new count.
    fn add(&mut self, identifier: &str, amount: u32) -> u32;

    /// Removes up to `amount` and returns how many were removed.
    fn remove(&mut self, identifier: &str, amount: u32) -> u32;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// In-memory inventory keyed case-insensitively.
pub struct MemoryInventory {
    stacks: BTreeMap<ItemKey, u32>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identifier: &str, amount: u32) -> Self {
        self.add(identifier, amount);
        self
    }
}

impl Inventory for MemoryInventory {
    fn count(&self, identifier: &str) -> u32 {
        self.stacks
            .get(&ItemKey::new(identifier))
            .copied()
            .unwrap_or(0)
    }

    fn add(&mut self, identifier: &str, amount: u32) -> u32 {
        let slot = self.stacks.entry(ItemKey::new(identifier)).or_insert(0);
        *slot = slot.saturating_add(amount);
        *slot
    }

    fn remove(&mut self, identifier: &str, amount: u32) -> u32 {
        let key = ItemKey::new(identifier);
        let Some(slot) = self.stacks.get_mut(&key) else {
            return 0;
        };
        let removed = amount.min(*slot);
        *slot -= removed;
        if *slot == 0 {
            self.stacks.remove(&key);
        }
        removed
    }
}

/// Currency operations checked against the registry.
pub struct Ledger<'r> {
    registry: &'r Registry,
}

impl<'r> Ledger<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Ledger { registry }
    }

    fn currency(&self, identifier: &str) -> Result<Arc<ItemDefinition>, QueryError> {
        let definition = self
            .registry
            .get(identifier)
            .ok_or_else(|| QueryError::UnknownItem(identifier.to_string()))?;
        match definition.category {
            Category::Currency | Category::Token => Ok(definition),
            _ => Err(QueryError::NotCurrency(definition.identifier.clone())),
        }
    }

    pub fn balance(&self, inventory: &dyn Inventory, identifier: &str) -> Result<u32, QueryError> {
        let definition = self.currency(identifier)?;
        Ok(inventory.count(&definition.identifier))
    }

    /// Take `amount` or nothing.
    pub fn consume(
        &self,
        inventory: &mut dyn Inventory,
        identifier: &str,
        amount: u32,
    ) -> Result<(), QueryError> {
        let definition = self.currency(identifier)?;
        let available = inventory.count(&definition.identifier);
        if available < amount {
            return Err(QueryError::Insufficient {
                id: definition.identifier.clone(),
                needed: amount,
                available,
            });
        }
        take(inventory, &[(definition.identifier.clone(), amount)])?;
        debug!(id = %definition.identifier, amount, "consumed currency");
        Ok(())
    }

    /// Returns the new balance.
    pub fn award(
        &self,
        inventory: &mut dyn Inventory,
        identifier: &str,
        amount: u32,
    ) -> Result<u32, QueryError> {
        let definition = self.currency(identifier)?;
        let balance = inventory.add(&definition.identifier, amount);
        debug!(id = %definition.identifier, amount, balance, "awarded currency");
        Ok(balance)
    }

    /// Whether every `identifier -> amount` in `costs` is covered. Identifiers
    /// that differ only in case are summed.
    pub fn can_afford(
        &self,
        inventory: &dyn Inventory,
        costs: &BTreeMap<String, u32>,
    ) -> Result<bool, QueryError> {
        let totals = self.merged(costs)?;
        Ok(totals
            .iter()
            .all(|(identifier, amount)| inventory.count(identifier) >= *amount))
    }

    /// Consume every cost in `costs`, or none of them.
    pub fn consume_all(
        &self,
        inventory: &mut dyn Inventory,
        costs: &BTreeMap<String, u32>,
    ) -> Result<(), QueryError> {
        let totals = self.merged(costs)?;
        for (identifier, amount) in &totals {
            let available = inventory.count(identifier);
            if available < *amount {
                return Err(QueryError::Insufficient {
                    id: identifier.clone(),
                    needed: *amount,
                    available,
                });
            }
        }
        let removals: Vec<(String, u32)> = totals.into_iter().collect();
        take(inventory, &removals)
    }

    fn merged(&self, costs: &BTreeMap<String, u32>) -> Result<BTreeMap<String, u32>, QueryError> {
        let mut totals: BTreeMap<String, u32> = BTreeMap::new();
        for (identifier, amount) in costs {
            let definition = self.currency(identifier)?;
            let total = totals.entry(definition.identifier.clone()).or_insert(0);
            *total = total.saturating_add(*amount);
        }
        Ok(totals)
    }
}

/// Remove every `(identifier, amount)`. When the inventory hands back less
/// than asked, whatever was removed so far is returned to it.
fn take(inventory: &mut dyn Inventory, removals: &[(String, u32)]) -> Result<(), QueryError> {
    let mut taken: Vec<(&str, u32)> = Vec::with_capacity(removals.len());
    for (identifier, amount) in removals {
        let removed = inventory.remove(identifier, *amount);
        taken.push((identifier.as_str(), removed));
        if removed < *amount {
            warn!(
                id = %identifier,
                needed = amount,
                removed,
                "inventory removed less than checked, rolling back"
            );
            for (identifier, removed) in taken {
                if removed > 0 {
                    inventory.add(identifier, removed);
                }
            }
            return Err(QueryError::Insufficient {
                id: identifier.clone(),
                needed: *amount,
                available: removed,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let registry = Registry::new();
        let mut coins = ItemDefinition::new("SilverCoin");
        coins.category = Category::Currency;
        coins.max_stack = 999;
        let mut token = ItemDefinition::new("GuildToken");
        token.category = Category::Token;
        let mut resin = ItemDefinition::new("Resin2");
        resin.category = Category::CraftingMaterial;
        assert!(registry.register(coins));
        assert!(registry.register(token));
        assert!(registry.register(resin));
        registry
    }

    #[test]
    fn balance_requires_a_registered_currency() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let inventory = MemoryInventory::new().with("SilverCoin", 12);
        assert_eq!(ledger.balance(&inventory, "silvercoin"), Ok(12));
        assert_eq!(ledger.balance(&inventory, "GuildToken"), Ok(0));
        assert_eq!(
            ledger.balance(&inventory, "Resin2"),
            Err(QueryError::NotCurrency("Resin2".into()))
        );
        assert_eq!(
            ledger.balance(&inventory, "Gold"),
            Err(QueryError::UnknownItem("Gold".into()))
        );
    }

    #[test]
    fn consume_is_all_or_nothing() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let mut inventory = MemoryInventory::new().with("SilverCoin", 5);
        assert_eq!(
            ledger.consume(&mut inventory, "SilverCoin", 7),
            Err(QueryError::Insufficient {
                id: "SilverCoin".into(),
                needed: 7,
                available: 5,
            })
        );
        assert_eq!(inventory.count("SilverCoin"), 5);
        ledger.consume(&mut inventory, "SilverCoin", 5).unwrap();
        assert_eq!(inventory.count("SilverCoin"), 0);
    }

    #[test]
    fn award_adds_to_balance() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let mut inventory = MemoryInventory::new();
        assert_eq!(ledger.award(&mut inventory, "GuildToken", 3), Ok(3));
        assert_eq!(ledger.award(&mut inventory, "guildtoken", 2), Ok(5));
    }

    #[test]
    fn batch_affordability_sums_case_variants() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let mut inventory = MemoryInventory::new()
            .with("SilverCoin", 10)
            .with("GuildToken", 1);

        let mut costs = BTreeMap::new();
        costs.insert("SilverCoin".to_string(), 6);
        costs.insert("silvercoin".to_string(), 4);
        costs.insert("GuildToken".to_string(), 1);
        assert_eq!(ledger.can_afford(&inventory, &costs), Ok(true));

        costs.insert("SILVERCOIN".to_string(), 1);
        assert_eq!(ledger.can_afford(&inventory, &costs), Ok(false));
        assert!(ledger.consume_all(&mut inventory, &costs).is_err());
        assert_eq!(inventory.count("SilverCoin"), 10);
        assert_eq!(inventory.count("GuildToken"), 1);

        costs.remove("SILVERCOIN");
        ledger.consume_all(&mut inventory, &costs).unwrap();
        assert_eq!(inventory.count("SilverCoin"), 0);
        assert_eq!(inventory.count("GuildToken"), 0);
    }

    /// Reports a full count but removes at most `cap` per call.
    struct CappedInventory {
        stacks: MemoryInventory,
        cap: u32,
    }

    impl Inventory for CappedInventory {
        fn count(&self, identifier: &str) -> u32 {
            self.stacks.count(identifier)
        }

        fn add(&mut self, identifier: &str, amount: u32) -> u32 {
            self.stacks.add(identifier, amount)
        }

        fn remove(&mut self, identifier: &str, amount: u32) -> u32 {
            self.stacks.remove(identifier, amount.min(self.cap))
        }
    }

    #[test]
    fn short_removal_is_reported_and_undone() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let mut inventory = CappedInventory {
            stacks: MemoryInventory::new().with("SilverCoin", 10),
            cap: 3,
        };
        assert_eq!(
            ledger.consume(&mut inventory, "SilverCoin", 5),
            Err(QueryError::Insufficient {
                id: "SilverCoin".into(),
                needed: 5,
                available: 3,
            })
        );
        assert_eq!(inventory.count("SilverCoin"), 10);
        ledger.consume(&mut inventory, "SilverCoin", 3).unwrap();
        assert_eq!(inventory.count("SilverCoin"), 7);
    }

    #[test]
    fn short_removal_in_a_batch_restores_earlier_removals() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let mut inventory = CappedInventory {
            stacks: MemoryInventory::new()
                .with("GuildToken", 2)
                .with("SilverCoin", 10),
            cap: 2,
        };
        let costs = BTreeMap::from([("GuildToken".to_string(), 2), ("SilverCoin".to_string(), 6)]);
        assert!(ledger.can_afford(&inventory, &costs).unwrap());
        assert_eq!(
            ledger.consume_all(&mut inventory, &costs),
            Err(QueryError::Insufficient {
                id: "SilverCoin".into(),
                needed: 6,
                available: 2,
            })
        );
        assert_eq!(inventory.count("GuildToken"), 2);
        assert_eq!(inventory.count("SilverCoin"), 10);
    }

    #[test]
    fn batch_with_non_currency_is_an_error() {
        let registry = registry();
        let ledger = Ledger::new(&registry);
        let inventory = MemoryInventory::new();
        let costs = BTreeMap::from([("Resin2".to_string(), 1)]);
        assert_eq!(
            ledger.can_afford(&inventory, &costs),
            Err(QueryError::NotCurrency("Resin2".into()))
        );
    }
}
