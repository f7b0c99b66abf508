//! The view a logic gets of the rest of the simulation while it ticks.
//!
//! A ticking building's own logic is lifted out of storage for the duration
//! of its tick, so every neighbor lookup here skips the caller. All
//! item moves between buildings go through [`TickContext`], which keeps the
//! peek / commit / extract ordering in one place and records a transfer
//! event for each unit moved.

use slotmap::SlotMap;
use tracing::trace;

use crate::building::Building;
use crate::event::{Event, EventBus};
use crate::fixed::Ticks;
use crate::grid::{Direction, GridPosition};
use crate::id::{BuildingId, ItemTypeId};
use crate::logic::{Logic, ProjectileSpawn};
use crate::registry::Registry;
use crate::world::Environment;

pub struct TickContext<'a> {
    pub(crate) buildings: &'a mut SlotMap<BuildingId, Building>,
    pub(crate) registry: &'a Registry,
    pub(crate) env: Environment<'a>,
    pub(crate) events: &'a mut EventBus,
    pub(crate) projectiles: &'a mut Vec<ProjectileSpawn>,
    pub(crate) tick: Ticks,
    pub(crate) ticks_per_second: u32,
}

impl<'a> TickContext<'a> {
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The building at `pos`, unless it is `this` or unknown to the engine.
    pub fn neighbor_at(&self, this: BuildingId, pos: GridPosition) -> Option<BuildingId> {
        self.env
            .world
            .building_at(pos)
            .filter(|&id| id != this && self.buildings.contains_key(id))
    }

    /// Logic of an active building. Inactive buildings take no part in
    /// transfers.
    fn live(&self, id: BuildingId) -> Option<&Logic> {
        let building = self.buildings.get(id)?;
        if !building.active {
            return None;
        }
        building.logic.as_ref()
    }

    fn live_mut(&mut self, id: BuildingId) -> Option<&mut Logic> {
        let building = self.buildings.get_mut(id)?;
        if !building.active {
            return None;
        }
        building.logic.as_mut()
    }

    /// Whether `belt` delivers into any cell of `target`.
    pub fn feeds_into(&self, belt: BuildingId, target: BuildingId) -> bool {
        let (Some(belt), Some(target)) = (self.buildings.get(belt), self.buildings.get(target))
        else {
            return false;
        };
        let Some(logic) = belt.logic.as_ref() else {
            return false;
        };
        logic
            .output_cells(&belt.frame)
            .into_iter()
            .any(|cell| target.frame.occupies(cell))
    }

    /// Facing of `id` if it is an active conveyor.
    pub fn conveyor_facing(&self, id: BuildingId) -> Option<Direction> {
        self.live(id)?.as_conveyor()?;
        self.buildings.get(id).map(|b| b.frame.facing())
    }

    /// Take the first item `source` provides. Peeks first and only extracts
    /// when there is something to take.
    pub fn take_from(&mut self, source: BuildingId, to: BuildingId) -> Option<ItemTypeId> {
        let tick = self.tick;
        let provider = self.live_mut(source)?.as_provider_mut()?;
        provider.peek_first()?;
        let item = provider.extract_first()?;
        self.events.emit(Event::ItemTransferred {
            from: source,
            to,
            item,
            tick,
        });
        Some(item)
    }

    /// Hand `item` from `from` to `to` through the generic acceptor path.
    /// Returns true when `to` took it.
    pub fn offer(&mut self, from: BuildingId, to: BuildingId, item: ItemTypeId) -> bool {
        let registry = self.registry;
        let Some(resolved) = registry.item(item) else {
            return false;
        };
        let Some(acceptor) = self.live_mut(to).and_then(Logic::as_acceptor_mut) else {
            return false;
        };
        if !acceptor.can_accept(resolved) || !acceptor.insert(resolved) {
            return false;
        }
        self.record_transfer(from, to, item);
        true
    }

    /// Merge `item` into the side of conveyor `to`.
    pub fn offer_side(&mut self, from: BuildingId, to: BuildingId, item: ItemTypeId) -> bool {
        let Some(conveyor) = self.live_mut(to).and_then(Logic::as_conveyor_mut) else {
            return false;
        };
        if !conveyor.side_insert(item) {
            return false;
        }
        self.record_transfer(from, to, item);
        true
    }

    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) {
        self.events.emit(Event::ProjectileFired {
            turret: spawn.turret,
            projectile: spawn.projectile,
            target: spawn.target,
            tick: spawn.tick,
        });
        self.projectiles.push(spawn);
    }

    fn record_transfer(&mut self, from: BuildingId, to: BuildingId, item: ItemTypeId) {
        trace!(?from, ?to, ?item, tick = self.tick, "item transferred");
        self.events.emit(Event::ItemTransferred {
            from,
            to,
            item,
            tick: self.tick,
        });
    }

    // -----------------------------------------------------------------------
    // Scheduler entry points
    // -----------------------------------------------------------------------

    /// Run one building's tick with its logic lifted out of storage.
    pub(crate) fn tick_building(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        if !building.active {
            return;
        }
        let frame = building.frame;
        let Some(mut logic) = building.logic.take() else {
            return;
        };
        logic.tick(&frame, self);
        if let Some(building) = self.buildings.get_mut(id) {
            building.logic = Some(logic);
        }
    }

    /// Push one unit from a non-belt provider into the first adjacent
    /// building that takes it.
    ///
    /// Neighbors of the same variant are skipped so two chests side by side
    /// do not trade the same item forever, and belts that deliver into the
    /// provider are skipped for the same reason.
    pub(crate) fn push_from(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        if !building.active {
            return;
        }
        let Some(logic) = building.logic.as_ref() else {
            return;
        };
        let kind = logic.kind();
        if kind.is_belt() {
            return;
        }
        let Some(item) = logic.as_provider().and_then(|p| p.peek_first()) else {
            return;
        };
        let registry = self.registry;
        let Some(resolved) = registry.item(item) else {
            return;
        };
        let frame = building.frame;

        let mut tried: Vec<BuildingId> = Vec::new();
        for (_, cell) in frame.perimeter() {
            let Some(target) = self.neighbor_at(id, cell) else {
                continue;
            };
            if tried.contains(&target) {
                continue;
            }
            tried.push(target);

            let Some(target_logic) = self.live(target) else {
                continue;
            };
            if target_logic.kind() == kind || self.feeds_into(target, id) {
                continue;
            }
            let accepts = target_logic
                .as_acceptor()
                .is_some_and(|a| a.can_accept(resolved));
            if !accepts {
                continue;
            }

            let inserted = self
                .live_mut(target)
                .and_then(Logic::as_acceptor_mut)
                .is_some_and(|a| a.insert(resolved));
            if !inserted {
                continue;
            }
            let extracted = self
                .live_mut(id)
                .and_then(Logic::as_provider_mut)
                .and_then(|p| p.extract_first());
            debug_assert_eq!(extracted, Some(item));
            self.record_transfer(id, target, item);
            return;
        }
    }
}

impl std::fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickContext")
            .field("tick", &self.tick)
            .field("ticks_per_second", &self.ticks_per_second)
            .finish_non_exhaustive()
    }
}
