use super::{ConfigError, ItemAcceptor};
use super::storage::validate_inventory;
use crate::item::Inventory;
use crate::registry::{InventoryConfig, Item};

/// The player's base. Stockpiles every item flagged as base-insertable; the
/// game reads and spends from its inventory directly.
#[derive(Debug, Clone)]
pub struct BaseLogic {
    inventory: Inventory,
}

impl BaseLogic {
    pub fn new(config: &InventoryConfig) -> Result<Self, ConfigError> {
        validate_inventory(config)?;
        Ok(Self {
            inventory: Inventory::new(config.slot_count, config.slot_capacity),
        })
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }
}

impl ItemAcceptor for BaseLogic {
    fn can_accept(&self, item: Item<'_>) -> bool {
        item.def.insertable_on_base && self.inventory.space_for(item.id) >= 1
    }

    fn insert(&mut self, item: Item<'_>) -> bool {
        self.can_accept(item) && self.inventory.add(item.id, 1)
    }
}
