//! The simulation engine: owns every placed building and runs the
//! fixed-timestep loop.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - the building records, keyed by [`BuildingId`], each with its [`Logic`]
//! - the registration order the scheduler walks every tick
//! - a [`SimState`] (tick counter, time accumulator)
//! - an [`EventBus`] for typed simulation events
//! - the queue of projectile spawns waiting for the projectile system
//!
//! The grid and the enemy set are not owned here. They are handed in on every
//! call through an [`Environment`].
//!
//! # Tick Pipeline
//!
//! Each tick runs:
//! 1. **Logic** -- every active registered logic ticks, in registration order
//! 2. **Push** -- providers that are not belts hand one unit to a neighbor
//! 3. **Post-tick** -- `TickCompleted` is recorded and buffered events are
//!    delivered to subscribers
//! 4. **Bookkeeping** -- tick counter and state hash are updated

use std::sync::Arc;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::building::Building;
use crate::config::EngineConfig;
use crate::context::TickContext;
use crate::event::{Event, EventBus, EventFilter, EventKind, PassiveListener, SubscriberPriority};
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Footprint, GridPosition, Rotation};
use crate::id::{BlockId, BuildingId, ItemTypeId};
use crate::item::Inventory;
use crate::logic::{BuildingFrame, ConfigError, Logic, LogicKind, ProjectileSpawn};
use crate::query::{BeltSnapshot, BuildingSnapshot, InventorySnapshot, SlotView, TurretSnapshot};
use crate::registry::Registry;
use crate::sim::{AdvanceResult, SimState, StateHash};
use crate::world::Environment;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown block: {0:?}")]
    UnknownBlock(BlockId),
    #[error("unknown building: {0:?}")]
    UnknownBuilding(BuildingId),
    #[error("invalid configuration for block {block}: {source}")]
    InvalidConfig {
        block: String,
        #[source]
        source: ConfigError,
    },
    #[error("invalid engine configuration: {0}")]
    InvalidEngineConfig(String),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    registry: Arc<Registry>,
    config: EngineConfig,
    /// Seconds per tick.
    step_length: Fixed64,

    buildings: SlotMap<BuildingId, Building>,
    /// Registered buildings in the order they tick.
    order: Vec<BuildingId>,

    sim_state: SimState,
    paused: bool,
    event_bus: EventBus,
    projectiles: Vec<ProjectileSpawn>,
    last_state_hash: u64,
}

impl Engine {
    /// An engine with the default configuration (60 ticks per second).
    pub fn new(registry: impl Into<Arc<Registry>>) -> Self {
        let config = EngineConfig::default();
        let step_length = Fixed64::ONE / Fixed64::from_num(config.ticks_per_second);
        Self::build(registry.into(), config, step_length)
    }

    pub fn with_config(
        registry: impl Into<Arc<Registry>>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if config.ticks_per_second == 0 {
            return Err(EngineError::InvalidEngineConfig(
                "ticks_per_second must be at least 1".to_string(),
            ));
        }
        let step_length = Fixed64::ONE / Fixed64::from_num(config.ticks_per_second);
        Ok(Self::build(registry.into(), config, step_length))
    }

    fn build(registry: Arc<Registry>, config: EngineConfig, step_length: Fixed64) -> Self {
        Self {
            registry,
            event_bus: EventBus::new(config.event_buffer_capacity),
            config,
            step_length,
            buildings: SlotMap::with_key(),
            order: Vec::new(),
            sim_state: SimState::default(),
            paused: false,
            projectiles: Vec::new(),
            last_state_hash: StateHash::new().finish(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_handle(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Length of one tick in seconds.
    pub fn step_length(&self) -> Fixed64 {
        self.step_length
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a building from a block template.
    ///
    /// The block's logic is built and validated here, so a bad configuration
    /// fails now and never during a tick. The new logic goes to the end of the
    /// tick order and gets its `on_placed` call immediately. Passive blocks
    /// are recorded but never tick.
    ///
    /// The engine does not check the grid; placement rules live with whoever
    /// owns the world.
    pub fn register(
        &mut self,
        block: BlockId,
        origin: GridPosition,
        rotation: Rotation,
    ) -> Result<BuildingId, EngineError> {
        let def = self
            .registry
            .get_block(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let logic = Logic::initialize(def).inspect_err(|e| {
            debug!(block = %def.name, error = %e, "rejected block configuration");
        })?;
        let footprint = Footprint::square(def.size);
        let ticks = logic.is_some();

        let id = self.buildings.insert_with_key(|id| Building {
            frame: BuildingFrame {
                id,
                block,
                origin,
                rotation,
                footprint,
            },
            active: true,
            logic,
        });

        if ticks {
            self.order.push(id);
            if let Some(logic) = self.buildings.get_mut(id).and_then(|b| b.logic.as_mut()) {
                logic.on_placed();
            }
            self.event_bus.emit(Event::BuildingRegistered {
                building: id,
                block,
                tick: self.sim_state.tick,
            });
        }
        debug!(building = ?id, block = %def.name, ?origin, ?rotation, ticks, "building registered");
        Ok(id)
    }

    /// Remove a building. Its logic is dropped and it leaves the tick order.
    /// Unknown ids (including ones already removed) return `None`.
    pub fn unregister(&mut self, id: BuildingId) -> Option<Building> {
        let mut building = self.buildings.remove(id)?;
        if building.logic.take().is_some() {
            self.order.retain(|&other| other != id);
            self.event_bus.emit(Event::BuildingUnregistered {
                building: id,
                tick: self.sim_state.tick,
            });
        }
        debug!(building = ?id, "building unregistered");
        Some(building)
    }

    /// Inactive buildings keep their state but neither tick nor take part in
    /// transfers.
    pub fn set_active(&mut self, id: BuildingId, active: bool) -> Result<(), EngineError> {
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(EngineError::UnknownBuilding(id))?;
        building.active = active;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Feed `dt` seconds of real time into the accumulator and run one tick
    /// for every whole step it now holds.
    pub fn advance(&mut self, dt: Fixed64, env: Environment<'_>) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused || dt <= Fixed64::ZERO {
            return result;
        }
        self.sim_state.accumulator = self.sim_state.accumulator.saturating_add(dt);

        while self.sim_state.accumulator >= self.step_length {
            if let Some(limit) = self.config.max_catch_up_steps
                && result.steps_run >= u64::from(limit)
            {
                warn!(
                    limit,
                    backlog = %self.sim_state.accumulator,
                    "catch-up limit reached, dropping remaining time"
                );
                self.sim_state.accumulator = Fixed64::ZERO;
                result.clamped = true;
                break;
            }
            self.sim_state.accumulator -= self.step_length;
            self.run_tick(env);
            result.steps_run += 1;
        }
        result
    }

    /// [`Engine::advance`] for callers that measure time as `f64` seconds.
    /// Non-finite or non-positive values are ignored.
    pub fn advance_secs(&mut self, seconds: f64, env: Environment<'_>) -> AdvanceResult {
        if !seconds.is_finite() || seconds <= 0.0 {
            return AdvanceResult::default();
        }
        self.advance(Fixed64::saturating_from_num(seconds), env)
    }

    /// Run exactly one tick, leaving the accumulator alone.
    pub fn step(&mut self, env: Environment<'_>) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        self.run_tick(env);
        AdvanceResult {
            steps_run: 1,
            clamped: false,
        }
    }

    fn run_tick(&mut self, env: Environment<'_>) {
        let mut ctx = TickContext {
            buildings: &mut self.buildings,
            registry: &self.registry,
            env,
            events: &mut self.event_bus,
            projectiles: &mut self.projectiles,
            tick: self.sim_state.tick,
            ticks_per_second: self.config.ticks_per_second,
        };

        for &id in &self.order {
            ctx.tick_building(id);
        }
        for &id in &self.order {
            ctx.push_from(id);
        }

        self.event_bus.emit(Event::TickCompleted);
        self.event_bus.deliver();

        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);
        for &id in &self.order {
            let Some(building) = self.buildings.get(id) else {
                continue;
            };
            hasher.write_u32(building.frame.block.0);
            hasher.write_position(building.frame.origin);
            hasher.write(&[building.frame.rotation.quarter_turns()]);
            hasher.write_bool(building.active);
            if let Some(logic) = &building.logic {
                logic.hash_into(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn sim_state(&self) -> &SimState {
        &self.sim_state
    }

    /// Hash of the simulation state after the last tick.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Events and projectiles
    // -----------------------------------------------------------------------

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        self.event_bus
            .on_passive_filtered(kind, priority, filter, listener);
    }

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    /// Take every projectile fired since the last call, oldest first.
    pub fn drain_projectiles(&mut self) -> Vec<ProjectileSpawn> {
        std::mem::take(&mut self.projectiles)
    }

    pub fn pending_projectiles(&self) -> &[ProjectileSpawn] {
        &self.projectiles
    }

    // -----------------------------------------------------------------------
    // Direct item access (player actions, scripted setups)
    // -----------------------------------------------------------------------

    /// Offer one unit of `item` to a building through its acceptor.
    pub fn insert_item(&mut self, id: BuildingId, item: ItemTypeId) -> bool {
        let Some(resolved) = self.registry.item(item) else {
            return false;
        };
        let Some(acceptor) = self
            .buildings
            .get_mut(id)
            .and_then(|b| b.logic.as_mut())
            .and_then(Logic::as_acceptor_mut)
        else {
            return false;
        };
        acceptor.can_accept(resolved) && acceptor.insert(resolved)
    }

    /// Take one unit from a building through its provider.
    pub fn extract_first(&mut self, id: BuildingId) -> Option<ItemTypeId> {
        let provider = self
            .buildings
            .get_mut(id)?
            .logic
            .as_mut()?
            .as_provider_mut()?;
        provider.peek_first()?;
        provider.extract_first()
    }

    pub fn inventory(&self, id: BuildingId) -> Option<&Inventory> {
        self.logic(id)?.inventory()
    }

    pub fn inventory_mut(&mut self, id: BuildingId) -> Option<&mut Inventory> {
        self.buildings.get_mut(id)?.logic.as_mut()?.inventory_mut()
    }

    // -----------------------------------------------------------------------
    // Query API (read-only)
    // -----------------------------------------------------------------------

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn logic(&self, id: BuildingId) -> Option<&Logic> {
        self.buildings.get(id)?.logic.as_ref()
    }

    /// Every building record, passive ones included.
    pub fn buildings(&self) -> impl Iterator<Item = (BuildingId, &Building)> {
        self.buildings.iter()
    }

    /// Registered buildings in tick order.
    pub fn registered(&self) -> &[BuildingId] {
        &self.order
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Registered logics of one variant, in tick order.
    pub fn logics_of(&self, kind: LogicKind) -> impl Iterator<Item = (BuildingId, &Logic)> + '_ {
        self.order.iter().filter_map(move |&id| {
            let logic = self.logic(id)?;
            (logic.kind() == kind).then_some((id, logic))
        })
    }

    /// Progress of one belt slot as a 0..1 fraction, for rendering items
    /// between cells.
    pub fn slot_progress(&self, id: BuildingId, slot: usize) -> Option<Fixed64> {
        let (slots, threshold) = self.logic(id)?.belt_slots()?;
        slots.get(slot).map(|s| s.normalized(threshold))
    }

    pub fn belt_snapshot(&self, id: BuildingId) -> Option<BeltSnapshot> {
        let building = self.buildings.get(id)?;
        let logic = building.logic.as_ref()?;
        let (slots, threshold) = logic.belt_slots()?;
        Some(BeltSnapshot {
            id,
            kind: logic.kind(),
            origin: building.frame.origin,
            facing: building.frame.facing(),
            slots: slots
                .iter()
                .map(|s| SlotView {
                    item: s.item(),
                    progress: s.normalized(threshold),
                })
                .collect(),
        })
    }

    /// Snapshots of every conveyor and splitter, in tick order.
    pub fn belt_snapshots(&self) -> Vec<BeltSnapshot> {
        self.order
            .iter()
            .filter_map(|&id| self.belt_snapshot(id))
            .collect()
    }

    pub fn inventory_snapshot(&self, id: BuildingId) -> Option<InventorySnapshot> {
        let logic = self.logic(id)?;
        let inventory = logic.inventory()?;
        Some(InventorySnapshot {
            id,
            kind: logic.kind(),
            contents: inventory.stacks(),
            total: inventory.total(),
        })
    }

    pub fn turret_snapshot(&self, id: BuildingId) -> Option<TurretSnapshot> {
        let turret = self.logic(id)?.as_turret()?;
        Some(TurretSnapshot {
            id,
            ammo: turret.ammo_len(),
            max_ammo: turret.max_ammo(),
            countdown: turret.countdown(),
        })
    }

    pub fn building_snapshot(&self, id: BuildingId) -> Option<BuildingSnapshot> {
        let building = self.buildings.get(id)?;
        Some(BuildingSnapshot {
            id,
            block: building.frame.block,
            origin: building.frame.origin,
            facing: building.frame.facing(),
            kind: building.kind(),
            active: building.active,
        })
    }
}
