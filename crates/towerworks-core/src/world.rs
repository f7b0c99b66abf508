//! Collaborator interfaces the simulation consumes but does not own.
//!
//! The grid itself, enemy movement and wave spawning live outside this crate.
//! Each step receives an [`Environment`] bundling read-only views of both, so
//! the engine never reaches into global state.

use glam::Vec2;

use crate::grid::GridPosition;
use crate::id::{BuildingId, EnemyId, TerrainId};

/// Position lookups against the placed-building grid.
pub trait WorldOracle {
    /// The building occupying `pos`, if any. Multi-cell buildings answer for
    /// every cell they cover.
    fn building_at(&self, pos: GridPosition) -> Option<BuildingId>;

    /// The terrain under `pos`, or `None` outside the map.
    fn terrain_at(&self, pos: GridPosition) -> Option<TerrainId>;
}

/// What a turret needs to know about an enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySnapshot {
    pub id: EnemyId,
    pub position: Vec2,
    /// World units per second.
    pub velocity: Vec2,
}

/// Spatial queries against the live enemy set.
pub trait EnemyOracle {
    fn enemies_in_radius(&self, center: Vec2, radius: f32) -> Vec<EnemySnapshot>;
}

/// An enemy oracle for phases with no enemies on the map.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnemies;

impl EnemyOracle for NoEnemies {
    fn enemies_in_radius(&self, _center: Vec2, _radius: f32) -> Vec<EnemySnapshot> {
        Vec::new()
    }
}

static NO_ENEMIES: NoEnemies = NoEnemies;

/// Read-only views handed to every tick.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    pub world: &'a dyn WorldOracle,
    pub enemies: &'a dyn EnemyOracle,
}

impl<'a> Environment<'a> {
    pub fn new(world: &'a dyn WorldOracle, enemies: &'a dyn EnemyOracle) -> Self {
        Self { world, enemies }
    }

    pub fn without_enemies(world: &'a dyn WorldOracle) -> Self {
        Self {
            world,
            enemies: &NO_ENEMIES,
        }
    }
}

impl std::fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
