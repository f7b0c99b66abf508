use super::ItemProvider;
use crate::id::ItemTypeId;
use crate::registry::CreativeConfig;

/// An endless supply of one item, for sandbox play and tests.
#[derive(Debug, Clone)]
pub struct CreativeItemProviderLogic {
    item: ItemTypeId,
}

impl CreativeItemProviderLogic {
    pub fn new(config: &CreativeConfig) -> Self {
        Self { item: config.item }
    }

    pub fn item(&self) -> ItemTypeId {
        self.item
    }
}

impl ItemProvider for CreativeItemProviderLogic {
    fn peek_first(&self) -> Option<ItemTypeId> {
        Some(self.item)
    }

    fn extract_first(&mut self) -> Option<ItemTypeId> {
        Some(self.item)
    }

    fn extract(&mut self, item: ItemTypeId) -> bool {
        item == self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_runs_dry() {
        let mut source = CreativeItemProviderLogic::new(&CreativeConfig { item: ItemTypeId(1) });
        for _ in 0..1000 {
            assert_eq!(source.extract_first(), Some(ItemTypeId(1)));
        }
        assert!(source.extract(ItemTypeId(1)));
        assert!(!source.extract(ItemTypeId(2)));
    }
}
