//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available everywhere tests run (via the `test-utils` feature).

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use crate::building::Building;
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::grid::{Footprint, GridPosition, Rotation};
use crate::id::*;
use crate::registry::*;
use crate::world::{EnemyOracle, EnemySnapshot, Environment, WorldOracle};

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// In-memory world
// ===========================================================================

/// A sparse grid: every cell a building covers maps to it, and terrain is
/// looked up per cell with an optional fallback.
#[derive(Debug, Default, Clone)]
pub struct TestWorld {
    cells: HashMap<GridPosition, BuildingId>,
    terrain: HashMap<GridPosition, TerrainId>,
    default_terrain: Option<TerrainId>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_terrain(terrain: TerrainId) -> Self {
        Self {
            default_terrain: Some(terrain),
            ..Self::default()
        }
    }

    pub fn set_terrain(&mut self, pos: GridPosition, terrain: TerrainId) {
        self.terrain.insert(pos, terrain);
    }

    /// Register a block with the engine and mark its cells.
    pub fn place(
        &mut self,
        engine: &mut Engine,
        block: BlockId,
        origin: GridPosition,
        rotation: Rotation,
    ) -> BuildingId {
        let size = engine
            .registry()
            .get_block(block)
            .map(|def| def.size)
            .unwrap_or(1);
        let id = engine
            .register(block, origin, rotation)
            .expect("fixture block should register");
        for cell in Footprint::square(size).tiles(origin) {
            self.cells.insert(cell, id);
        }
        id
    }

    pub fn remove(&mut self, engine: &mut Engine, id: BuildingId) -> Option<Building> {
        self.cells.retain(|_, occupant| *occupant != id);
        engine.unregister(id)
    }

    pub fn env(&self) -> Environment<'_> {
        Environment::without_enemies(self)
    }
}

impl WorldOracle for TestWorld {
    fn building_at(&self, pos: GridPosition) -> Option<BuildingId> {
        self.cells.get(&pos).copied()
    }

    fn terrain_at(&self, pos: GridPosition) -> Option<TerrainId> {
        self.terrain.get(&pos).copied().or(self.default_terrain)
    }
}

/// A fixed list of enemies answering radius queries.
#[derive(Debug, Default, Clone)]
pub struct TestEnemies {
    pub enemies: Vec<EnemySnapshot>,
}

impl TestEnemies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: u64, position: Vec2, velocity: Vec2) {
        self.enemies.push(EnemySnapshot {
            id: EnemyId(id),
            position,
            velocity,
        });
    }
}

impl EnemyOracle for TestEnemies {
    fn enemies_in_radius(&self, center: Vec2, radius: f32) -> Vec<EnemySnapshot> {
        self.enemies
            .iter()
            .filter(|e| e.position.distance(center) <= radius)
            .copied()
            .collect()
    }
}

// ===========================================================================
// Registry fixture
// ===========================================================================

/// Ids of everything the fixture registry defines.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub registry: Arc<Registry>,

    pub iron_ore: ItemTypeId,
    pub copper_ore: ItemTypeId,
    pub bullet: ItemTypeId,
    /// A resource the base refuses.
    pub rock: ItemTypeId,

    pub bullet_shot: ProjectileTypeId,

    pub grass: TerrainId,
    pub ore_field: TerrainId,
    pub stone: TerrainId,

    /// 3 slots, 60 ticks per slot.
    pub conveyor: BlockId,
    /// 2 slots, 1 tick per slot.
    pub fast_conveyor: BlockId,
    /// 1 tick per slot.
    pub splitter: BlockId,
    /// 4 slots of 100.
    pub storage: BlockId,
    /// 1x1, efficiency 1 on ore fields, buffer of 9.
    pub drill: BlockId,
    /// 2x2 version of `drill`.
    pub big_drill: BlockId,
    pub creative: BlockId,
    pub ammo_source: BlockId,
    /// Range 6, reload 20, up to 20 rounds.
    pub turret: BlockId,
    /// 3x3, not removable.
    pub base: BlockId,
    /// 1x1 base with a single slot, used as a sink.
    pub depot: BlockId,
    pub wall: BlockId,
}

pub fn fixture() -> Fixture {
    let mut b = RegistryBuilder::new();

    let bullet_shot = b.register_projectile(ProjectileDef {
        name: "bullet_shot".to_string(),
        speed: 10.0,
        damage: 5,
        collision_radius: 0.25,
        lifetime: 2.0,
        penetration: 1,
    });

    let iron_ore = b.register_item(ItemDef::resource("iron_ore"));
    let copper_ore = b.register_item(ItemDef::resource("copper_ore"));
    let bullet = b.register_item(ItemDef::ammo("bullet", bullet_shot));
    let rock = b.register_item(ItemDef::resource("rock").not_base_insertable());

    let grass = b.register_terrain(TerrainDef {
        name: "grass".to_string(),
        solid: false,
        movement_cost: 1,
    });
    let ore_field = b.register_terrain(TerrainDef {
        name: "ore_field".to_string(),
        solid: false,
        movement_cost: 1,
    });
    let stone = b.register_terrain(TerrainDef {
        name: "stone".to_string(),
        solid: true,
        movement_cost: 0,
    });

    let conveyor = b.register_block(BlockDef::new(
        "conveyor",
        BlockKind::Conveyor(ConveyorConfig {
            ticks_per_slot: 60,
            slot_count: 3,
            seed_item: None,
        }),
    ));
    let fast_conveyor = b.register_block(BlockDef::new(
        "fast_conveyor",
        BlockKind::Conveyor(ConveyorConfig {
            ticks_per_slot: 1,
            slot_count: 2,
            seed_item: None,
        }),
    ));
    let splitter = b.register_block(BlockDef::new(
        "splitter",
        BlockKind::Splitter(SplitterConfig { ticks_per_slot: 1 }),
    ));
    let storage = b.register_block(BlockDef::new(
        "storage",
        BlockKind::Storage(InventoryConfig {
            slot_count: 4,
            slot_capacity: 100,
        }),
    ));
    let drill_config = DrillConfig {
        output: iron_ore,
        terrain: ore_field,
        efficiency_per_tile: Fixed64::ONE,
        buffer_cap: 9,
    };
    let drill = b.register_block(BlockDef::new("drill", BlockKind::Drill(drill_config.clone())));
    let big_drill = b.register_block(
        BlockDef::new("big_drill", BlockKind::Drill(drill_config)).with_size(2),
    );
    let creative = b.register_block(BlockDef::new(
        "creative",
        BlockKind::CreativeSource(CreativeConfig { item: iron_ore }),
    ));
    let ammo_source = b.register_block(BlockDef::new(
        "ammo_source",
        BlockKind::CreativeSource(CreativeConfig { item: bullet }),
    ));
    let turret = b.register_block(
        BlockDef::new(
            "turret",
            BlockKind::Turret(TurretConfig {
                range: 6.0,
                reload_ticks: 20,
                max_ammo: 20,
                projectiles: vec![bullet_shot],
            }),
        )
        .with_cost(iron_ore, 10),
    );
    let base = b.register_block(
        BlockDef::new(
            "base",
            BlockKind::Base(InventoryConfig {
                slot_count: 8,
                slot_capacity: 100,
            }),
        )
        .with_size(3)
        .not_removable(),
    );
    let depot = b.register_block(BlockDef::new(
        "depot",
        BlockKind::Base(InventoryConfig {
            slot_count: 1,
            slot_capacity: 100,
        }),
    ));
    let wall = b.register_block(BlockDef::new("wall", BlockKind::Passive).with_cost(iron_ore, 2));

    let registry = b.build().expect("fixture registry is valid");

    Fixture {
        registry: Arc::new(registry),
        iron_ore,
        copper_ore,
        bullet,
        rock,
        bullet_shot,
        grass,
        ore_field,
        stone,
        conveyor,
        fast_conveyor,
        splitter,
        storage,
        drill,
        big_drill,
        creative,
        ammo_source,
        turret,
        base,
        depot,
        wall,
    }
}

impl Fixture {
    pub fn engine(&self) -> Engine {
        Engine::new(Arc::clone(&self.registry))
    }
}

// ===========================================================================
// Running
// ===========================================================================

/// Step `engine` `n` times against `world` with no enemies.
pub fn run(engine: &mut Engine, world: &TestWorld, n: u64) {
    let env = world.env();
    for _ in 0..n {
        engine.step(env);
    }
}

/// Step `engine` `n` times with enemies present.
pub fn run_with_enemies(engine: &mut Engine, world: &TestWorld, enemies: &TestEnemies, n: u64) {
    let env = Environment::new(world, enemies);
    for _ in 0..n {
        engine.step(env);
    }
}

/// Items on belts plus items in storage-like inventories plus ammo loaded
/// into turrets.
pub fn items_in_world(engine: &Engine) -> u64 {
    engine
        .registered()
        .iter()
        .filter_map(|&id| engine.logic(id))
        .map(|logic| {
            let on_belt = logic
                .belt_slots()
                .map(|(slots, _)| slots.iter().filter(|s| !s.is_empty()).count() as u64)
                .unwrap_or(0);
            let stored = logic.inventory().map(|inv| u64::from(inv.total())).unwrap_or(0);
            let ammo = logic.as_turret().map(|t| t.ammo_len() as u64).unwrap_or(0);
            on_belt + stored + ammo
        })
        .sum()
}
