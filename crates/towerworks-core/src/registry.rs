use crate::fixed::{Fixed64, Ticks};
use crate::id::*;
use std::collections::HashMap;

/// An item type definition. Items are descriptors only; quantities live in
/// whatever holds them.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    pub name: String,
    /// Ammo can be loaded into turrets.
    pub is_ammo: bool,
    /// The projectile fired when this item is used as ammo.
    pub projectile: Option<ProjectileTypeId>,
    /// Whether the player base stockpiles this item.
    pub insertable_on_base: bool,
}

impl ItemDef {
    /// A plain resource that the base accepts.
    pub fn resource(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_ammo: false,
            projectile: None,
            insertable_on_base: true,
        }
    }

    /// An ammo item that fires `projectile`.
    pub fn ammo(name: &str, projectile: ProjectileTypeId) -> Self {
        Self {
            name: name.to_string(),
            is_ammo: true,
            projectile: Some(projectile),
            insertable_on_base: true,
        }
    }

    pub fn not_base_insertable(mut self) -> Self {
        self.insertable_on_base = false;
        self
    }
}

/// A resolved item: its id together with its definition.
#[derive(Debug, Clone, Copy)]
pub struct Item<'a> {
    pub id: ItemTypeId,
    pub def: &'a ItemDef,
}

/// Stats of a projectile type, handed to the projectile system on spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileDef {
    pub name: String,
    /// World units per second.
    pub speed: f32,
    pub damage: u32,
    pub collision_radius: f32,
    /// Seconds before the projectile expires.
    pub lifetime: f32,
    /// Enemies a projectile can pass through before it dies.
    pub penetration: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainDef {
    pub name: String,
    /// Solid terrain cannot be built on or walked through.
    pub solid: bool,
    pub movement_cost: u32,
}

/// One entry of a block's construction cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildCost {
    pub item: ItemTypeId,
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// Per-logic configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorConfig {
    /// Ticks an item spends in each slot.
    pub ticks_per_slot: Ticks,
    pub slot_count: usize,
    /// Item placed into slot 0 when the conveyor is built.
    pub seed_item: Option<ItemTypeId>,
}

impl Default for ConveyorConfig {
    fn default() -> Self {
        Self {
            ticks_per_slot: 60,
            slot_count: 4,
            seed_item: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitterConfig {
    pub ticks_per_slot: Ticks,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self { ticks_per_slot: 60 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    pub slot_count: usize,
    pub slot_capacity: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            slot_count: 1,
            slot_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrillConfig {
    pub output: ItemTypeId,
    /// Terrain the drill mines. Only footprint cells on this terrain count.
    pub terrain: TerrainId,
    /// Units per second contributed by each matching cell.
    pub efficiency_per_tile: Fixed64,
    /// Mined units held before the drill stops.
    pub buffer_cap: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreativeConfig {
    pub item: ItemTypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurretConfig {
    /// Targeting radius in world units, measured from the turret center.
    pub range: f32,
    /// Ticks between shots.
    pub reload_ticks: Ticks,
    pub max_ammo: usize,
    /// Projectile types this turret can fire. Ammo for anything else is
    /// refused.
    pub projectiles: Vec<ProjectileTypeId>,
}

/// The logic variant of a block together with its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// No logic at all (walls, decorations).
    Passive,
    Conveyor(ConveyorConfig),
    Splitter(SplitterConfig),
    Storage(InventoryConfig),
    Drill(DrillConfig),
    CreativeSource(CreativeConfig),
    Turret(TurretConfig),
    Base(InventoryConfig),
}

/// A block template: the immutable description of a placeable structure.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub name: String,
    /// Edge length of the square footprint.
    pub size: u32,
    pub kind: BlockKind,
    pub solid: bool,
    pub removable: bool,
    pub health: u32,
    pub cost: Vec<BuildCost>,
}

impl BlockDef {
    /// A 1x1 solid, removable block with default health and no cost.
    pub fn new(name: &str, kind: BlockKind) -> Self {
        Self {
            name: name.to_string(),
            size: 1,
            kind,
            solid: true,
            removable: true,
            health: 100,
            cost: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_cost(mut self, item: ItemTypeId, amount: u32) -> Self {
        self.cost.push(BuildCost { item, amount });
        self
    }

    pub fn non_solid(mut self) -> Self {
        self.solid = false;
        self
    }

    pub fn not_removable(mut self) -> Self {
        self.removable = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable Registry.
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    projectiles: Vec<ProjectileDef>,
    projectile_name_to_id: HashMap<String, ProjectileTypeId>,
    terrain: Vec<TerrainDef>,
    terrain_name_to_id: HashMap<String, TerrainId>,
    blocks: Vec<BlockDef>,
    block_name_to_id: HashMap<String, BlockId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register an item type. Returns its ID.
    pub fn register_item(&mut self, def: ItemDef) -> ItemTypeId {
        let id = ItemTypeId(self.items.len() as u32);
        self.item_name_to_id.insert(def.name.clone(), id);
        self.items.push(def);
        id
    }

    /// Phase 1: Register a projectile type. Returns its ID.
    pub fn register_projectile(&mut self, def: ProjectileDef) -> ProjectileTypeId {
        let id = ProjectileTypeId(self.projectiles.len() as u32);
        self.projectile_name_to_id.insert(def.name.clone(), id);
        self.projectiles.push(def);
        id
    }

    /// Phase 1: Register a terrain type. Returns its ID.
    pub fn register_terrain(&mut self, def: TerrainDef) -> TerrainId {
        let id = TerrainId(self.terrain.len() as u32);
        self.terrain_name_to_id.insert(def.name.clone(), id);
        self.terrain.push(def);
        id
    }

    /// Phase 1: Register a block template. Returns its ID.
    pub fn register_block(&mut self, def: BlockDef) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.block_name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        id
    }

    /// Phase 2: Mutate an existing block template by name.
    pub fn mutate_block<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut BlockDef),
    {
        let id = self
            .block_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.blocks[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing item type by name.
    pub fn mutate_item<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ItemDef),
    {
        let id = self
            .item_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.items[id.0 as usize]);
        Ok(())
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn projectile_id(&self, name: &str) -> Option<ProjectileTypeId> {
        self.projectile_name_to_id.get(name).copied()
    }

    pub fn terrain_id(&self, name: &str) -> Option<TerrainId> {
        self.terrain_name_to_id.get(name).copied()
    }

    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.block_name_to_id.get(name).copied()
    }

    /// Phase 3: Validate every cross reference and freeze the registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let item_ok = |id: ItemTypeId| (id.0 as usize) < self.items.len();
        let projectile_ok = |id: ProjectileTypeId| (id.0 as usize) < self.projectiles.len();

        for item in &self.items {
            if item.is_ammo && item.projectile.is_none() {
                return Err(RegistryError::AmmoWithoutProjectile(item.name.clone()));
            }
            if let Some(p) = item.projectile
                && !projectile_ok(p)
            {
                return Err(RegistryError::InvalidProjectileRef(p));
            }
        }

        for block in &self.blocks {
            for cost in &block.cost {
                if !item_ok(cost.item) {
                    return Err(RegistryError::InvalidItemRef(cost.item));
                }
            }
            match &block.kind {
                BlockKind::Conveyor(cfg) => {
                    if let Some(seed) = cfg.seed_item
                        && !item_ok(seed)
                    {
                        return Err(RegistryError::InvalidItemRef(seed));
                    }
                }
                BlockKind::Drill(cfg) => {
                    if !item_ok(cfg.output) {
                        return Err(RegistryError::InvalidItemRef(cfg.output));
                    }
                    if cfg.terrain.0 as usize >= self.terrain.len() {
                        return Err(RegistryError::InvalidTerrainRef(cfg.terrain));
                    }
                }
                BlockKind::CreativeSource(cfg) => {
                    if !item_ok(cfg.item) {
                        return Err(RegistryError::InvalidItemRef(cfg.item));
                    }
                }
                BlockKind::Turret(cfg) => {
                    if let Some(&p) = cfg.projectiles.iter().find(|&&p| !projectile_ok(p)) {
                        return Err(RegistryError::InvalidProjectileRef(p));
                    }
                }
                BlockKind::Passive
                | BlockKind::Splitter(_)
                | BlockKind::Storage(_)
                | BlockKind::Base(_) => {}
            }
        }

        Ok(Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            projectiles: self.projectiles,
            projectile_name_to_id: self.projectile_name_to_id,
            terrain: self.terrain,
            terrain_name_to_id: self.terrain_name_to_id,
            blocks: self.blocks,
            block_name_to_id: self.block_name_to_id,
        })
    }
}

/// Immutable registry. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Registry {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    projectiles: Vec<ProjectileDef>,
    projectile_name_to_id: HashMap<String, ProjectileTypeId>,
    terrain: Vec<TerrainDef>,
    terrain_name_to_id: HashMap<String, TerrainId>,
    blocks: Vec<BlockDef>,
    block_name_to_id: HashMap<String, BlockId>,
}

impl Registry {
    pub fn get_item(&self, id: ItemTypeId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    /// The item with its id attached, for capability checks.
    pub fn item(&self, id: ItemTypeId) -> Option<Item<'_>> {
        self.get_item(id).map(|def| Item { id, def })
    }

    pub fn get_projectile(&self, id: ProjectileTypeId) -> Option<&ProjectileDef> {
        self.projectiles.get(id.0 as usize)
    }

    pub fn get_terrain(&self, id: TerrainId) -> Option<&TerrainDef> {
        self.terrain.get(id.0 as usize)
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn projectile_id(&self, name: &str) -> Option<ProjectileTypeId> {
        self.projectile_name_to_id.get(name).copied()
    }

    pub fn terrain_id(&self, name: &str) -> Option<TerrainId> {
        self.terrain_name_to_id.get(name).copied()
    }

    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.block_name_to_id.get(name).copied()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn terrain_count(&self) -> usize {
        self.terrain.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Terrain solidity; unknown terrain counts as solid.
    pub fn terrain_is_solid(&self, id: TerrainId) -> bool {
        self.get_terrain(id).map(|t| t.solid).unwrap_or(true)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
    #[error("invalid projectile reference: {0:?}")]
    InvalidProjectileRef(ProjectileTypeId),
    #[error("invalid terrain reference: {0:?}")]
    InvalidTerrainRef(TerrainId),
    #[error("ammo item {0} has no projectile")]
    AmmoWithoutProjectile(String),
}
