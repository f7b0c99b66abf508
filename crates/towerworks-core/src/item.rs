use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// A quantity of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }
}

/// One inventory slot: a single item type up to `capacity` units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item: Option<ItemTypeId>,
    pub amount: u32,
    pub capacity: u32,
}

impl InventorySlot {
    pub fn new(capacity: u32) -> Self {
        Self {
            item: None,
            amount: 0,
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// How many units of `item` this slot can still take.
    pub fn space_for(&self, item: ItemTypeId) -> u32 {
        match self.item {
            Some(held) if held != item && self.amount > 0 => 0,
            _ => self.capacity.saturating_sub(self.amount),
        }
    }

    fn take(&mut self, amount: u32) {
        self.amount -= amount;
        if self.amount == 0 {
            self.item = None;
        }
    }
}

/// A fixed array of single-type slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new(slot_count: usize, slot_capacity: u32) -> Self {
        Self {
            slots: (0..slot_count)
                .map(|_| InventorySlot::new(slot_capacity))
                .collect(),
        }
    }

    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    /// Total units of `item` that would still fit.
    pub fn space_for(&self, item: ItemTypeId) -> u32 {
        self.slots.iter().map(|s| s.space_for(item)).sum()
    }

    /// Add `amount` units of `item`, filling slots that already hold it or are
    /// empty, in slot order. All or nothing: returns false and leaves the
    /// inventory untouched when the full amount does not fit.
    #[must_use = "false means nothing was added"]
    pub fn add(&mut self, item: ItemTypeId, amount: u32) -> bool {
        if self.space_for(item) < amount {
            return false;
        }
        let mut remaining = amount;
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            let moved = slot.space_for(item).min(remaining);
            if moved > 0 {
                slot.item = Some(item);
                slot.amount += moved;
                remaining -= moved;
            }
        }
        true
    }

    /// Remove `amount` units of `item` across slots, last slot first. All or
    /// nothing, like [`Inventory::add`].
    #[must_use = "false means nothing was removed"]
    pub fn remove(&mut self, item: ItemTypeId, amount: u32) -> bool {
        if self.count(item) < amount {
            return false;
        }
        let mut remaining = amount;
        for slot in self.slots.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            if slot.item == Some(item) {
                let moved = slot.amount.min(remaining);
                slot.take(moved);
                remaining -= moved;
            }
        }
        true
    }

    /// The item in the first non-empty slot, without removing it.
    pub fn peek_first(&self) -> Option<ItemTypeId> {
        self.slots.iter().find(|s| !s.is_empty()).and_then(|s| s.item)
    }

    /// Remove one unit from the first non-empty slot.
    pub fn extract_first(&mut self) -> Option<ItemTypeId> {
        let slot = self.slots.iter_mut().find(|s| !s.is_empty())?;
        let item = slot.item;
        slot.take(1);
        item
    }

    /// Remove one unit of `item`, if present.
    pub fn extract(&mut self, item: ItemTypeId) -> bool {
        self.remove(item, 1)
    }

    pub fn count(&self, item: ItemTypeId) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item == Some(item))
            .map(|s| s.amount)
            .sum()
    }

    pub fn contains(&self, item: ItemTypeId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Total units across all slots.
    pub fn total(&self) -> u32 {
        self.slots.iter().map(|s| s.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(InventorySlot::is_empty)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.item = None;
            slot.amount = 0;
        }
    }

    /// Per-type totals in first-seen slot order.
    pub fn stacks(&self) -> Vec<ItemStack> {
        let mut stacks: Vec<ItemStack> = Vec::new();
        for slot in &self.slots {
            let Some(item) = slot.item else { continue };
            match stacks.iter_mut().find(|s| s.item_type == item) {
                Some(stack) => stack.quantity += slot.amount,
                None => stacks.push(ItemStack::new(item, slot.amount)),
            }
        }
        stacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron() -> ItemTypeId {
        ItemTypeId(0)
    }

    fn copper() -> ItemTypeId {
        ItemTypeId(1)
    }

    #[test]
    fn add_spills_into_next_slot() {
        let mut inv = Inventory::new(2, 10);
        assert!(inv.add(iron(), 15));
        assert_eq!(inv.slots()[0].amount, 10);
        assert_eq!(inv.slots()[1].amount, 5);
        assert_eq!(inv.count(iron()), 15);
    }

    #[test]
    fn add_is_atomic_when_full() {
        let mut inv = Inventory::new(2, 10);
        assert!(inv.add(copper(), 10));
        assert!(inv.add(iron(), 5));
        let before = inv.clone();
        assert!(!inv.add(iron(), 6));
        assert_eq!(inv, before);
    }

    #[test]
    fn slots_hold_a_single_type() {
        let mut inv = Inventory::new(1, 100);
        assert!(inv.add(iron(), 1));
        assert_eq!(inv.space_for(copper()), 0);
        assert!(!inv.add(copper(), 1));
    }

    #[test]
    fn emptied_slot_accepts_another_type() {
        let mut inv = Inventory::new(1, 100);
        assert!(inv.add(iron(), 1));
        assert_eq!(inv.extract_first(), Some(iron()));
        assert!(inv.add(copper(), 1));
        assert_eq!(inv.peek_first(), Some(copper()));
    }

    #[test]
    fn peek_is_non_destructive() {
        let mut inv = Inventory::new(3, 5);
        assert!(inv.add(iron(), 2));
        assert_eq!(inv.peek_first(), Some(iron()));
        assert_eq!(inv.peek_first(), Some(iron()));
        assert_eq!(inv.total(), 2);
    }

    #[test]
    fn extract_first_takes_exactly_one() {
        let mut inv = Inventory::new(2, 5);
        assert!(inv.add(iron(), 3));
        assert_eq!(inv.extract_first(), Some(iron()));
        assert_eq!(inv.count(iron()), 2);
    }

    #[test]
    fn extract_first_on_empty_returns_none() {
        let mut inv = Inventory::new(2, 5);
        assert_eq!(inv.extract_first(), None);
        assert!(inv.is_empty());
    }

    #[test]
    fn remove_is_atomic() {
        let mut inv = Inventory::new(2, 5);
        assert!(inv.add(iron(), 7));
        assert!(!inv.remove(iron(), 8));
        assert_eq!(inv.count(iron()), 7);
        assert!(inv.remove(iron(), 6));
        assert_eq!(inv.count(iron()), 1);
        assert!(inv.extract(iron()));
        assert!(!inv.extract(iron()));
    }

    #[test]
    fn contains_and_clear() {
        let mut inv = Inventory::new(2, 5);
        assert!(inv.add(iron(), 3));
        assert!(inv.contains(iron(), 3));
        assert!(!inv.contains(iron(), 4));
        inv.clear();
        assert!(inv.is_empty());
        assert_eq!(inv.total(), 0);
    }

    #[test]
    fn stacks_merge_slots() {
        let mut inv = Inventory::new(3, 4);
        assert!(inv.add(iron(), 6));
        assert!(inv.add(copper(), 2));
        assert_eq!(
            inv.stacks(),
            vec![ItemStack::new(iron(), 6), ItemStack::new(copper(), 2)]
        );
    }
}
