//! Towerworks Core -- the building simulation for tower-defense and
//! automation games.
//!
//! This crate owns every placed building's logic (conveyors, splitters,
//! storage, drills, creative sources, turrets and the base), the
//! fixed-timestep scheduler that ticks them, and the neighbor-to-neighbor
//! item transfers that connect them. The grid and the enemy set stay
//! outside: each step receives them through a [`world::Environment`].
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one tick:
//!
//! 1. **Logic** -- every active building ticks in registration order. Belts
//!    move their slots, drills mine, turrets count down and fire.
//! 2. **Push** -- storage, drills and creative sources hand one unit to the
//!    first adjacent building that takes it.
//! 3. **Post-tick** -- `TickCompleted` is emitted and buffered events are
//!    delivered.
//! 4. **Bookkeeping** -- the tick counter and state hash are updated.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- scheduler, building store and query surface.
//! - [`logic::Logic`] -- one variant per building behavior, exposing the
//!   [`logic::ItemAcceptor`] and [`logic::ItemProvider`] capabilities.
//! - [`registry::Registry`] -- immutable items, projectiles, terrain and
//!   block templates (frozen at startup).
//! - [`item::Inventory`] -- fixed slot array with atomic adds.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventBus`] -- typed events with buffered delivery.

pub mod building;
pub mod config;
pub mod context;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod item;
pub mod logic;
pub mod query;
pub mod registry;
pub mod sim;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
