//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for items, projectiles, terrain
//! and blocks. They are deserialized from RON, JSON, or TOML data files and
//! then resolved into registry types by the loader. Cross-references are by
//! name.

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

// ===========================================================================
// Items and projectiles
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    /// Whether turrets accept this item as ammunition.
    #[serde(default)]
    pub ammo: bool,
    /// Projectile fired when this item is used as ammo.
    #[serde(default)]
    pub projectile: Option<String>,
    #[serde(default = "default_true")]
    pub base_insertable: bool,
}

/// A projectile type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectileData {
    pub name: String,
    pub speed: f32,
    pub damage: u32,
    #[serde(default = "default_collision_radius")]
    pub collision_radius: f32,
    /// Seconds before the projectile expires.
    #[serde(default = "default_lifetime")]
    pub lifetime: f32,
    #[serde(default = "default_one")]
    pub penetration: u32,
}

fn default_collision_radius() -> f32 {
    0.25
}

fn default_lifetime() -> f32 {
    3.0
}

// ===========================================================================
// Terrain
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TerrainData {
    pub name: String,
    #[serde(default)]
    pub solid: bool,
    #[serde(default = "default_one")]
    pub movement_cost: u32,
}

// ===========================================================================
// Blocks
// ===========================================================================

/// A block (placeable structure) definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    pub name: String,
    #[serde(default = "default_one")]
    pub size: u32,
    pub logic: LogicData,
    #[serde(default = "default_true")]
    pub solid: bool,
    #[serde(default = "default_true")]
    pub removable: bool,
    #[serde(default = "default_health")]
    pub health: u32,
    /// `(item, amount)` pairs paid on placement.
    #[serde(default)]
    pub cost: Vec<(String, u32)>,
}

fn default_health() -> u32 {
    100
}

/// The behavior attached to a block.
#[derive(Debug, Clone, Deserialize)]
pub enum LogicData {
    Passive,
    Conveyor {
        #[serde(default = "default_ticks_per_slot")]
        ticks_per_slot: u64,
        #[serde(default = "default_belt_slots")]
        slot_count: usize,
        #[serde(default)]
        seed_item: Option<String>,
    },
    Splitter {
        #[serde(default = "default_ticks_per_slot")]
        ticks_per_slot: u64,
    },
    Storage {
        #[serde(default = "default_one_usize")]
        slot_count: usize,
        #[serde(default = "default_slot_capacity")]
        slot_capacity: u32,
    },
    Drill {
        output: String,
        terrain: String,
        /// Units per second per matching tile.
        efficiency_per_tile: f64,
        #[serde(default = "default_buffer_cap")]
        buffer_cap: u32,
    },
    CreativeSource {
        item: String,
    },
    Turret {
        range: f32,
        reload_ticks: u64,
        max_ammo: usize,
        projectiles: Vec<String>,
    },
    Base {
        #[serde(default = "default_one_usize")]
        slot_count: usize,
        #[serde(default = "default_slot_capacity")]
        slot_capacity: u32,
    },
}

fn default_ticks_per_slot() -> u64 {
    60
}

fn default_belt_slots() -> usize {
    4
}

fn default_one_usize() -> usize {
    1
}

fn default_slot_capacity() -> u32 {
    100
}

fn default_buffer_cap() -> u32 {
    9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults() {
        let item: ItemData = ron::from_str(r#"(name: "iron_ore")"#).unwrap();
        assert!(!item.ammo);
        assert!(item.projectile.is_none());
        assert!(item.base_insertable);
    }

    #[test]
    fn ammo_item_from_json() {
        let item: ItemData =
            serde_json::from_str(r#"{"name": "bullet", "ammo": true, "projectile": "shot"}"#).unwrap();
        assert!(item.ammo);
        assert_eq!(item.projectile.as_deref(), Some("shot"));
    }

    #[test]
    fn conveyor_defaults_from_ron() {
        let block: BlockData = ron::from_str(r#"(name: "belt", logic: Conveyor(ticks_per_slot: 30))"#).unwrap();
        assert_eq!(block.size, 1);
        assert!(block.solid);
        assert!(block.removable);
        match block.logic {
            LogicData::Conveyor {
                ticks_per_slot,
                slot_count,
                seed_item,
            } => {
                assert_eq!(ticks_per_slot, 30);
                assert_eq!(slot_count, 4);
                assert!(seed_item.is_none());
            }
            other => panic!("expected conveyor, got {other:?}"),
        }
    }

    #[test]
    fn passive_block_from_ron() {
        let block: BlockData =
            ron::from_str(r#"(name: "wall", logic: Passive, cost: [("stone", 2)])"#).unwrap();
        assert!(matches!(block.logic, LogicData::Passive));
        assert_eq!(block.cost, vec![("stone".to_string(), 2)]);
    }

    #[test]
    fn turret_from_toml() {
        let toml_str = r#"
name = "gun"
size = 2

[logic.Turret]
range = 7.5
reload_ticks = 30
max_ammo = 10
projectiles = ["shot"]
"#;
        let block: BlockData = toml::from_str(toml_str).unwrap();
        assert_eq!(block.size, 2);
        match block.logic {
            LogicData::Turret {
                range,
                reload_ticks,
                max_ammo,
                projectiles,
            } => {
                assert_eq!(range, 7.5);
                assert_eq!(reload_ticks, 30);
                assert_eq!(max_ammo, 10);
                assert_eq!(projectiles, vec!["shot".to_string()]);
            }
            other => panic!("expected turret, got {other:?}"),
        }
    }

    #[test]
    fn projectile_defaults() {
        let p: ProjectileData = ron::from_str(r#"(name: "shot", speed: 12.0, damage: 3)"#).unwrap();
        assert_eq!(p.collision_radius, 0.25);
        assert_eq!(p.lifetime, 3.0);
        assert_eq!(p.penetration, 1);
    }
}
