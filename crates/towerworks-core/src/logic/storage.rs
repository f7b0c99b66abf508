use super::{ConfigError, ItemAcceptor, ItemProvider};
use crate::id::ItemTypeId;
use crate::item::Inventory;
use crate::registry::{InventoryConfig, Item};

/// A chest: accepts anything that fits and hands it back out in slot order.
#[derive(Debug, Clone)]
pub struct StorageLogic {
    inventory: Inventory,
}

impl StorageLogic {
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

pub(super) fn validate_inventory(config: &InventoryConfig) -> Result<(), ConfigError> {
    ConfigError::at_least("slot_count", 1, config.slot_count as u64)?;
    ConfigError::at_least("slot_capacity", 1, u64::from(config.slot_capacity))
}

impl ItemAcceptor for StorageLogic {
    fn can_accept(&self, item: Item<'_>) -> bool {
        self.inventory.space_for(item.id) >= 1
    }

    fn insert(&mut self, item: Item<'_>) -> bool {
        self.inventory.add(item.id, 1)
    }
}

impl ItemProvider for StorageLogic {
    fn peek_first(&self) -> Option<ItemTypeId> {
        self.inventory.peek_first()
    }

    fn extract_first(&mut self) -> Option<ItemTypeId> {
        self.inventory.extract_first()
    }

    fn extract(&mut self, item: ItemTypeId) -> bool {
        self.inventory.extract(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ItemDef;

    #[test]
    fn empty_inventory_config_is_rejected() {
        let cfg = InventoryConfig {
            slot_count: 0,
            slot_capacity: 10,
        };
        assert!(matches!(
            StorageLogic::new(&cfg),
            Err(ConfigError::TooSmall { field: "slot_count", min: 1, actual: 0 })
        ));
    }

    #[test]
    fn accepts_until_full_then_provides() {
        let def = ItemDef::resource("ore");
        let ore = Item {
            id: ItemTypeId(0),
            def: &def,
        };
        let mut chest = StorageLogic::new(&InventoryConfig {
            slot_count: 1,
            slot_capacity: 2,
        })
        .unwrap();
        assert!(chest.insert(ore));
        assert!(chest.insert(ore));
        assert!(!chest.can_accept(ore));
        assert!(!chest.insert(ore));

        assert_eq!(chest.peek_first(), Some(ore.id));
        assert_eq!(chest.extract_first(), Some(ore.id));
        assert!(chest.extract(ore.id));
        assert_eq!(chest.extract_first(), None);
        assert!(!chest.extract(ore.id));
    }
}
