//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the registry.
//!
//! A content directory holds `items`, `blocks` and optionally `projectiles`,
//! `terrain` and `engine` files, each in RON, TOML or JSON. Names are
//! resolved in dependency order: projectiles, items, terrain, then blocks.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use towerworks_core::config::EngineConfig;
use towerworks_core::engine::{Engine, EngineError};
use towerworks_core::fixed::f64_to_fixed64;
use towerworks_core::id::{ItemTypeId, ProjectileTypeId, TerrainId};
use towerworks_core::registry::{
    BlockDef, BlockKind, BuildCost, ConveyorConfig, CreativeConfig, DrillConfig, InventoryConfig,
    ItemDef, ProjectileDef, Registry, RegistryBuilder, RegistryError, SplitterConfig, TerrainDef,
    TurretConfig,
};

use crate::schema::{BlockData, ItemData, LogicData, ProjectileData, TerrainData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A value parsed but cannot be used.
    #[error("invalid value for '{name}' in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        name: String,
        detail: String,
    },

    /// The resolved definitions failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at
/// `toml_key` from the top-level table. For RON and JSON, the file is the
/// list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

/// An optional list file: absent means empty.
fn optional_list<T: DeserializeOwned>(dir: &Path, base_name: &str) -> Result<(Vec<T>, PathBuf), DataLoadError> {
    match find_data_file(dir, base_name)? {
        Some(path) => Ok((deserialize_list(&path, base_name)?, path)),
        None => Ok((Vec::new(), dir.join(base_name))),
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<V: Copy>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<V, DataLoadError> {
    map.get(name).copied().ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Return a `DuplicateName` error if `name` is already in `map`.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Everything loaded from a content directory.
#[derive(Debug)]
pub struct Content {
    pub registry: Registry,
    pub engine: EngineConfig,
}

impl Content {
    /// An engine over this content, configured by the `engine` file.
    pub fn into_engine(self) -> Result<Engine, EngineError> {
        Engine::with_config(self.registry, self.engine)
    }
}

#[derive(Default)]
struct Names {
    items: HashMap<String, ItemTypeId>,
    projectiles: HashMap<String, ProjectileTypeId>,
    terrain: HashMap<String, TerrainId>,
}

/// Load every content file in `dir` and build a validated registry.
pub fn load_content(dir: &Path) -> Result<Content, DataLoadError> {
    let mut builder = RegistryBuilder::new();
    let mut names = Names::default();

    let (projectiles, projectiles_path) = optional_list::<ProjectileData>(dir, "projectiles")?;
    for data in projectiles {
        check_duplicate(&names.projectiles, &data.name, &projectiles_path)?;
        let id = builder.register_projectile(ProjectileDef {
            name: data.name.clone(),
            speed: data.speed,
            damage: data.damage,
            collision_radius: data.collision_radius,
            lifetime: data.lifetime,
            penetration: data.penetration,
        });
        names.projectiles.insert(data.name, id);
    }

    let items_path = require_data_file(dir, "items")?;
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    for data in items {
        check_duplicate(&names.items, &data.name, &items_path)?;
        let projectile = data
            .projectile
            .as_deref()
            .map(|p| resolve_name(&names.projectiles, p, &items_path, "projectile"))
            .transpose()?;
        let id = builder.register_item(ItemDef {
            name: data.name.clone(),
            is_ammo: data.ammo,
            projectile,
            insertable_on_base: data.base_insertable,
        });
        names.items.insert(data.name, id);
    }

    let (terrain, terrain_path) = optional_list::<TerrainData>(dir, "terrain")?;
    for data in terrain {
        check_duplicate(&names.terrain, &data.name, &terrain_path)?;
        let id = builder.register_terrain(TerrainDef {
            name: data.name.clone(),
            solid: data.solid,
            movement_cost: data.movement_cost,
        });
        names.terrain.insert(data.name, id);
    }

    let blocks_path = require_data_file(dir, "blocks")?;
    let blocks: Vec<BlockData> = deserialize_list(&blocks_path, "blocks")?;
    let mut block_names: HashMap<String, ()> = HashMap::new();
    for data in blocks {
        check_duplicate(&block_names, &data.name, &blocks_path)?;
        let def = resolve_block(&data, &names, &blocks_path)?;
        debug!(block = %def.name, "resolved block");
        builder.register_block(def);
        block_names.insert(data.name, ());
    }

    let engine = match find_data_file(dir, "engine")? {
        Some(path) => deserialize_file(&path)?,
        None => EngineConfig::default(),
    };

    let registry = builder.build()?;
    info!(
        items = registry.item_count(),
        projectiles = registry.projectile_count(),
        terrain = registry.terrain_count(),
        blocks = registry.block_count(),
        ticks_per_second = engine.ticks_per_second,
        "content loaded from {}",
        dir.display()
    );
    Ok(Content { registry, engine })
}

fn resolve_block(data: &BlockData, names: &Names, file: &Path) -> Result<BlockDef, DataLoadError> {
    let item = |name: &str| resolve_name(&names.items, name, file, "item");

    let kind = match &data.logic {
        LogicData::Passive => BlockKind::Passive,
        LogicData::Conveyor {
            ticks_per_slot,
            slot_count,
            seed_item,
        } => BlockKind::Conveyor(ConveyorConfig {
            ticks_per_slot: *ticks_per_slot,
            slot_count: *slot_count,
            seed_item: seed_item.as_deref().map(item).transpose()?,
        }),
        LogicData::Splitter { ticks_per_slot } => BlockKind::Splitter(SplitterConfig {
            ticks_per_slot: *ticks_per_slot,
        }),
        LogicData::Storage {
            slot_count,
            slot_capacity,
        } => BlockKind::Storage(InventoryConfig {
            slot_count: *slot_count,
            slot_capacity: *slot_capacity,
        }),
        LogicData::Drill {
            output,
            terrain,
            efficiency_per_tile,
            buffer_cap,
        } => {
            if !efficiency_per_tile.is_finite() {
                return Err(DataLoadError::InvalidValue {
                    file: file.to_path_buf(),
                    name: data.name.clone(),
                    detail: format!("efficiency_per_tile must be finite, got {efficiency_per_tile}"),
                });
            }
            BlockKind::Drill(DrillConfig {
                output: item(output)?,
                terrain: resolve_name(&names.terrain, terrain, file, "terrain")?,
                efficiency_per_tile: f64_to_fixed64(*efficiency_per_tile),
                buffer_cap: *buffer_cap,
            })
        }
        LogicData::CreativeSource { item: source } => {
            BlockKind::CreativeSource(CreativeConfig { item: item(source)? })
        }
        LogicData::Turret {
            range,
            reload_ticks,
            max_ammo,
            projectiles,
        } => BlockKind::Turret(TurretConfig {
            range: *range,
            reload_ticks: *reload_ticks,
            max_ammo: *max_ammo,
            projectiles: projectiles
                .iter()
                .map(|p| resolve_name(&names.projectiles, p, file, "projectile"))
                .collect::<Result<_, _>>()?,
        }),
        LogicData::Base {
            slot_count,
            slot_capacity,
        } => BlockKind::Base(InventoryConfig {
            slot_count: *slot_count,
            slot_capacity: *slot_capacity,
        }),
    };

    let cost = data
        .cost
        .iter()
        .map(|(name, amount)| {
            Ok(BuildCost {
                item: item(name)?,
                amount: *amount,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    Ok(BlockDef {
        name: data.name.clone(),
        size: data.size,
        kind,
        solid: data.solid,
        removable: data.removable,
        health: data.health,
        cost,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
