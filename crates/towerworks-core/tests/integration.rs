//! End-to-end scenarios for the building simulation: drills, belts,
//! splitters, storage, turrets and the push pass running together.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use towerworks_core::config::EngineConfig;
use towerworks_core::engine::Engine;
use towerworks_core::event::{Event, EventKind};
use towerworks_core::fixed::Fixed64;
use towerworks_core::grid::{GridPosition, Rotation};
use towerworks_core::id::*;
use towerworks_core::logic::LogicKind;
use towerworks_core::test_utils::*;

fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

/// Route engine logs to the test harness. Later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn belt_items(engine: &Engine, id: BuildingId) -> Vec<Option<ItemTypeId>> {
    engine
        .belt_snapshot(id)
        .expect("belt snapshot")
        .slots
        .iter()
        .map(|s| s.item)
        .collect()
}

fn stored(engine: &Engine, id: BuildingId, item: ItemTypeId) -> u32 {
    engine.inventory(id).map(|inv| inv.count(item)).unwrap_or(0)
}

/// Record the target of every transfer out of `from`.
fn record_transfers_from(engine: &mut Engine, from: BuildingId) -> Rc<RefCell<Vec<BuildingId>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.on_passive(
        EventKind::ItemTransferred,
        Box::new(move |e: &Event| {
            if let Event::ItemTransferred { from: f, to, .. } = e
                && *f == from
            {
                sink.borrow_mut().push(*to);
            }
        }),
    );
    log
}

// ===========================================================================
// Drills
// ===========================================================================

#[test]
fn drill_mines_one_unit_per_second_per_tile() {
    init_tracing();
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.ore_field);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);

    run(&mut engine, &world, 59);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 0);

    run(&mut engine, &world, 1);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 1);
}

#[test]
fn drill_only_counts_matching_tiles() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.grass);
    world.set_terrain(pos(0, 0), fx.ore_field);
    world.set_terrain(pos(1, 1), fx.ore_field);
    let drill = world.place(&mut engine, fx.big_drill, pos(0, 0), Rotation::None);

    run(&mut engine, &world, 60);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 2);
}

#[test]
fn drill_on_wrong_terrain_produces_nothing() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.grass);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);

    run(&mut engine, &world, 600);
    let logic = engine.logic(drill).unwrap().as_drill().unwrap();
    assert_eq!(logic.available(), 0);
    assert_eq!(logic.accumulator(), Fixed64::ZERO);
}

#[test]
fn drill_buffer_caps_production() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.ore_field);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);

    run(&mut engine, &world, 60 * 20);
    let logic = engine.logic(drill).unwrap().as_drill().unwrap();
    assert_eq!(logic.available(), 9);
    assert!(logic.is_full());
}

#[test]
fn drill_rate_follows_tick_rate() {
    let fx = fixture();
    let cfg = EngineConfig {
        ticks_per_second: 30,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(fx.registry.clone(), cfg).unwrap();
    let mut world = TestWorld::with_default_terrain(fx.ore_field);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);

    // One simulated second at 30 ticks per second.
    engine.advance_secs(1.0, world.env());
    assert_eq!(engine.tick(), 30);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 1);
}

#[test]
fn inactive_drill_does_not_mine() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.ore_field);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);
    engine.set_active(drill, false).unwrap();

    run(&mut engine, &world, 120);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 0);

    engine.set_active(drill, true).unwrap();
    run(&mut engine, &world, 60);
    assert_eq!(engine.logic(drill).unwrap().as_drill().unwrap().available(), 1);
}

// ===========================================================================
// Conveyors
// ===========================================================================

#[test]
fn item_crosses_three_slot_conveyor_in_180_ticks() {
    init_tracing();
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let belt = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::Cw90);
    let depot = world.place(&mut engine, fx.depot, pos(1, 0), Rotation::None);

    assert!(engine.insert_item(belt, fx.iron_ore));

    run(&mut engine, &world, 179);
    assert_eq!(belt_items(&engine, belt), vec![None, None, Some(fx.iron_ore)]);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 0);

    run(&mut engine, &world, 1);
    assert_eq!(belt_items(&engine, belt), vec![None, None, None]);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 1);
}

#[test]
fn slot_progress_is_normalized() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let belt = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::Cw90);
    engine.insert_item(belt, fx.iron_ore);

    run(&mut engine, &world, 30);
    assert_eq!(engine.slot_progress(belt, 0), Some(fixed(0.5)));
    assert_eq!(engine.slot_progress(belt, 1), Some(Fixed64::ZERO));
    assert_eq!(engine.slot_progress(belt, 7), None);
}

#[test]
fn blocked_belt_holds_items_at_threshold() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let belt = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::Cw90);

    assert!(engine.insert_item(belt, fx.iron_ore));
    run(&mut engine, &world, 400);
    assert_eq!(engine.slot_progress(belt, 2), Some(Fixed64::ONE));

    assert!(engine.insert_item(belt, fx.copper_ore));
    run(&mut engine, &world, 400);
    assert!(engine.insert_item(belt, fx.iron_ore));
    run(&mut engine, &world, 400);

    assert_eq!(
        belt_items(&engine, belt),
        vec![Some(fx.iron_ore), Some(fx.copper_ore), Some(fx.iron_ore)]
    );
    for slot in 0..3 {
        assert_eq!(engine.slot_progress(belt, slot), Some(Fixed64::ONE));
    }
    // Slot 0 is occupied, so the belt refuses more.
    assert!(!engine.insert_item(belt, fx.iron_ore));
}

#[test]
fn head_on_belts_do_not_trade_items() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let east = world.place(&mut engine, fx.fast_conveyor, pos(0, 0), Rotation::Cw90);
    let west = world.place(&mut engine, fx.fast_conveyor, pos(1, 0), Rotation::Cw270);

    engine.insert_item(east, fx.iron_ore);
    engine.insert_item(west, fx.copper_ore);

    run(&mut engine, &world, 50);
    assert_eq!(belt_items(&engine, east), vec![None, Some(fx.iron_ore)]);
    assert_eq!(belt_items(&engine, west), vec![None, Some(fx.copper_ore)]);
    assert_eq!(engine.events().total_emitted(EventKind::ItemTransferred), 0);
}

#[test]
fn side_feed_lands_one_tick_from_ready() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let main = world.place(&mut engine, fx.conveyor, pos(1, 0), Rotation::Cw90);
    let side = world.place(&mut engine, fx.fast_conveyor, pos(1, 1), Rotation::None);

    engine.insert_item(side, fx.iron_ore);
    run(&mut engine, &world, 2);

    assert_eq!(belt_items(&engine, side), vec![None, None]);
    assert_eq!(belt_items(&engine, main), vec![None, Some(fx.iron_ore), None]);
    assert_eq!(engine.slot_progress(main, 1), Some(Fixed64::from_num(59) / Fixed64::from_num(60)));

    run(&mut engine, &world, 1);
    assert_eq!(belt_items(&engine, main), vec![None, None, Some(fx.iron_ore)]);
}

/// Record the source of every transfer into `to`.
fn record_transfers_into(engine: &mut Engine, to: BuildingId) -> Rc<RefCell<Vec<BuildingId>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.on_passive(
        EventKind::ItemTransferred,
        Box::new(move |e: &Event| {
            if let Event::ItemTransferred { from, to: t, .. } = e
                && *t == to
            {
                sink.borrow_mut().push(*from);
            }
        }),
    );
    log
}

#[test]
fn conveyor_pulls_right_then_left_then_behind() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    // Facing north: right is east, left is west, behind is south.
    let belt = world.place(&mut engine, fx.conveyor, pos(5, 5), Rotation::None);
    let right = world.place(&mut engine, fx.storage, pos(6, 5), Rotation::None);
    let left = world.place(&mut engine, fx.storage, pos(4, 5), Rotation::None);
    let behind = world.place(&mut engine, fx.storage, pos(5, 6), Rotation::None);
    assert!(engine.inventory_mut(right).unwrap().add(fx.copper_ore, 1));
    assert!(engine.inventory_mut(left).unwrap().add(fx.iron_ore, 1));
    assert!(engine.inventory_mut(behind).unwrap().add(fx.iron_ore, 1));
    let log = record_transfers_into(&mut engine, belt);

    run(&mut engine, &world, 1);
    assert_eq!(*log.borrow(), vec![right]);

    // Slot 0 stays occupied for a full slot time, so nothing else is pulled.
    run(&mut engine, &world, 59);
    assert_eq!(*log.borrow(), vec![right]);
    assert_eq!(stored(&engine, left, fx.iron_ore), 1);
    assert_eq!(stored(&engine, behind, fx.iron_ore), 1);

    run(&mut engine, &world, 1);
    assert_eq!(*log.borrow(), vec![right, left]);

    run(&mut engine, &world, 60);
    assert_eq!(*log.borrow(), vec![right, left, behind]);
    assert_eq!(
        belt_items(&engine, belt),
        vec![Some(fx.iron_ore), Some(fx.iron_ore), Some(fx.copper_ore)]
    );
}

#[test]
fn conveyor_prefers_lateral_sources_over_the_rear() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let belt = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::Cw90);
    // Facing east: left is north, behind is west.
    let left = world.place(&mut engine, fx.storage, pos(0, -1), Rotation::None);
    let behind = world.place(&mut engine, fx.storage, pos(-1, 0), Rotation::None);
    assert!(engine.inventory_mut(left).unwrap().add(fx.copper_ore, 2));
    assert!(engine.inventory_mut(behind).unwrap().add(fx.iron_ore, 2));
    let log = record_transfers_into(&mut engine, belt);

    run(&mut engine, &world, 61);
    assert_eq!(*log.borrow(), vec![left, left]);
    assert_eq!(stored(&engine, behind, fx.iron_ore), 2);
}

#[test]
fn straight_belts_chain() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let first = world.place(&mut engine, fx.fast_conveyor, pos(0, 0), Rotation::Cw90);
    let second = world.place(&mut engine, fx.fast_conveyor, pos(1, 0), Rotation::Cw90);
    let depot = world.place(&mut engine, fx.depot, pos(2, 0), Rotation::None);

    engine.insert_item(first, fx.iron_ore);
    run(&mut engine, &world, 10);

    assert_eq!(stored(&engine, depot, fx.iron_ore), 1);
    assert_eq!(belt_items(&engine, first), vec![None, None]);
    assert_eq!(belt_items(&engine, second), vec![None, None]);
}

#[test]
fn removing_a_belt_drops_its_items() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let belt = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::Cw90);
    engine.insert_item(belt, fx.iron_ore);
    run(&mut engine, &world, 10);

    let removed = world.remove(&mut engine, belt).unwrap();
    assert!(removed.logic().is_none());
    assert_eq!(items_in_world(&engine), 0);
    run(&mut engine, &world, 10);
    assert!(engine.belt_snapshot(belt).is_none());
}

// ===========================================================================
// Splitters
// ===========================================================================

/// Splitter at (5,5) facing north, fed from a creative source behind it.
struct SplitterRig {
    engine: Engine,
    world: TestWorld,
    splitter: BuildingId,
    north: BuildingId,
    east: BuildingId,
    west: BuildingId,
}

fn splitter_rig(east_block: fn(&Fixture) -> BlockId) -> (Fixture, SplitterRig) {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let splitter = world.place(&mut engine, fx.splitter, pos(5, 5), Rotation::None);
    let north = world.place(&mut engine, fx.depot, pos(5, 4), Rotation::None);
    let east = world.place(&mut engine, east_block(&fx), pos(6, 5), Rotation::None);
    let west = world.place(&mut engine, fx.depot, pos(4, 5), Rotation::None);
    world.place(&mut engine, fx.creative, pos(5, 6), Rotation::None);
    let rig = SplitterRig {
        engine,
        world,
        splitter,
        north,
        east,
        west,
    };
    (fx, rig)
}

#[test]
fn splitter_round_robins_forward_right_left() {
    let (fx, mut rig) = splitter_rig(|fx| fx.depot);
    let log = record_transfers_from(&mut rig.engine, rig.splitter);

    run(&mut rig.engine, &rig.world, 7);

    assert_eq!(
        *log.borrow(),
        vec![rig.north, rig.east, rig.west, rig.north, rig.east, rig.west]
    );
    for depot in [rig.north, rig.east, rig.west] {
        assert_eq!(stored(&rig.engine, depot, fx.iron_ore), 2);
    }
}

#[test]
fn splitter_skips_a_refusing_output() {
    // A turret takes ammo only, so iron ore is refused on the east side.
    let (_fx, mut rig) = splitter_rig(|fx| fx.turret);
    let log = record_transfers_from(&mut rig.engine, rig.splitter);

    run(&mut rig.engine, &rig.world, 5);

    assert_eq!(*log.borrow(), vec![rig.north, rig.west, rig.north, rig.west]);
    assert_eq!(rig.engine.turret_snapshot(rig.east).unwrap().ammo, 0);
}

#[test]
fn fully_blocked_splitter_keeps_item_and_pointer() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let splitter = world.place(&mut engine, fx.splitter, pos(0, 0), Rotation::None);
    world.place(&mut engine, fx.wall, pos(0, -1), Rotation::None);

    assert!(engine.insert_item(splitter, fx.copper_ore));
    run(&mut engine, &world, 20);

    let logic = engine.logic(splitter).unwrap().as_splitter().unwrap();
    assert_eq!(logic.slot().item(), Some(fx.copper_ore));
    assert_eq!(logic.next_output(), 0);
}

#[test]
fn conveyor_feeds_splitter_from_the_side() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let splitter = world.place(&mut engine, fx.splitter, pos(5, 5), Rotation::None);
    let depot = world.place(&mut engine, fx.depot, pos(5, 4), Rotation::None);
    // Faces west into the splitter's east side, which is also one of the
    // splitter's outputs.
    let belt = world.place(&mut engine, fx.fast_conveyor, pos(6, 5), Rotation::Cw270);

    assert!(engine.insert_item(belt, fx.iron_ore));
    run(&mut engine, &world, 200);

    assert_eq!(belt_items(&engine, belt), vec![None, None]);
    assert_eq!(engine.logic(splitter).unwrap().as_splitter().unwrap().slot().item(), None);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 1);
}

// ===========================================================================
// Push pass
// ===========================================================================

#[test]
fn storage_pushes_one_unit_per_tick() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let chest = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    let depot = world.place(&mut engine, fx.depot, pos(1, 0), Rotation::None);
    assert!(engine.inventory_mut(chest).unwrap().add(fx.iron_ore, 5));

    run(&mut engine, &world, 1);
    assert_eq!(stored(&engine, chest, fx.iron_ore), 4);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 1);

    run(&mut engine, &world, 10);
    assert_eq!(stored(&engine, chest, fx.iron_ore), 0);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 5);
}

#[test]
fn neighboring_storages_do_not_ping_pong() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let left = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    let right = world.place(&mut engine, fx.storage, pos(1, 0), Rotation::None);
    assert!(engine.inventory_mut(left).unwrap().add(fx.iron_ore, 5));

    run(&mut engine, &world, 20);
    assert_eq!(stored(&engine, left, fx.iron_ore), 5);
    assert_eq!(stored(&engine, right, fx.iron_ore), 0);
}

#[test]
fn storage_does_not_push_into_belt_feeding_it() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let chest = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    let belt = world.place(&mut engine, fx.conveyor, pos(1, 0), Rotation::Cw270);
    assert!(engine.inventory_mut(chest).unwrap().add(fx.iron_ore, 5));

    run(&mut engine, &world, 20);
    assert_eq!(stored(&engine, chest, fx.iron_ore), 5);
    assert_eq!(belt_items(&engine, belt), vec![None, None, None]);
}

#[test]
fn inactive_storage_neither_pushes_nor_accepts() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let chest = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    let depot = world.place(&mut engine, fx.depot, pos(1, 0), Rotation::None);
    let belt = world.place(&mut engine, fx.fast_conveyor, pos(0, 1), Rotation::None);
    assert!(engine.inventory_mut(chest).unwrap().add(fx.iron_ore, 5));
    engine.set_active(chest, false).unwrap();
    engine.insert_item(belt, fx.copper_ore);

    run(&mut engine, &world, 20);
    assert_eq!(stored(&engine, chest, fx.iron_ore), 5);
    assert_eq!(stored(&engine, chest, fx.copper_ore), 0);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 0);
    assert_eq!(belt_items(&engine, belt), vec![None, Some(fx.copper_ore)]);
}

#[test]
fn drill_to_belt_to_storage_conserves_units() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::with_default_terrain(fx.grass);
    world.set_terrain(pos(0, 0), fx.ore_field);
    let drill = world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);
    let belt = world.place(&mut engine, fx.fast_conveyor, pos(1, 0), Rotation::Cw90);
    let chest = world.place(&mut engine, fx.storage, pos(2, 0), Rotation::None);

    run(&mut engine, &world, 600);

    let in_drill = engine.logic(drill).unwrap().as_drill().unwrap().available();
    let on_belt = belt_items(&engine, belt).iter().flatten().count() as u32;
    let in_chest = stored(&engine, chest, fx.iron_ore);
    assert_eq!(in_drill + on_belt + in_chest, 10);
    assert!(in_chest >= 9);
}

#[test]
fn base_refuses_items_marked_not_insertable() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let base = world.place(&mut engine, fx.base, pos(0, 0), Rotation::None);

    assert!(!engine.insert_item(base, fx.rock));
    assert!(engine.insert_item(base, fx.iron_ore));
    assert_eq!(engine.inventory_snapshot(base).unwrap().total, 1);
    // The base gives nothing back.
    assert_eq!(engine.extract_first(base), None);
}

#[test]
fn belt_delivers_into_any_cell_of_multi_tile_base() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let base = world.place(&mut engine, fx.base, pos(0, 0), Rotation::None);
    // Enters the base's bottom-right cell from the south.
    let belt = world.place(&mut engine, fx.fast_conveyor, pos(2, 3), Rotation::None);
    engine.insert_item(belt, fx.copper_ore);

    run(&mut engine, &world, 5);
    assert_eq!(stored(&engine, base, fx.copper_ore), 1);
}

// ===========================================================================
// Turrets
// ===========================================================================

#[test]
fn turret_fires_on_reload_and_runs_dry() {
    init_tracing();
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let turret = world.place(&mut engine, fx.turret, pos(0, 0), Rotation::None);
    let mut enemies = TestEnemies::new();
    enemies.add(1, Vec2::new(3.5, 0.5), Vec2::ZERO);

    assert!(engine.insert_item(turret, fx.bullet));
    assert!(engine.insert_item(turret, fx.bullet));

    run_with_enemies(&mut engine, &world, &enemies, 60);

    let shots = engine.drain_projectiles();
    let ticks: Vec<u64> = shots.iter().map(|s| s.tick).collect();
    assert_eq!(ticks, vec![0, 20]);
    assert!(shots.iter().all(|s| s.target == EnemyId(1)));
    assert_eq!(shots[0].projectile, fx.bullet_shot);
    assert_eq!(shots[0].damage, 5);
    assert_eq!(engine.turret_snapshot(turret).unwrap().ammo, 0);
    assert!(engine.drain_projectiles().is_empty());
}

#[test]
fn turret_holds_fire_without_targets() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let turret = world.place(&mut engine, fx.turret, pos(0, 0), Rotation::None);
    let mut enemies = TestEnemies::new();
    enemies.add(1, Vec2::new(20.0, 0.5), Vec2::ZERO);
    engine.insert_item(turret, fx.bullet);

    run_with_enemies(&mut engine, &world, &enemies, 30);
    assert!(engine.drain_projectiles().is_empty());
    let snapshot = engine.turret_snapshot(turret).unwrap();
    assert_eq!(snapshot.ammo, 1);
    assert_eq!(snapshot.countdown, 0);
}

#[test]
fn turret_targets_nearest_with_lowest_id_on_ties() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let turret = world.place(&mut engine, fx.turret, pos(0, 0), Rotation::None);
    engine.insert_item(turret, fx.bullet);

    let mut enemies = TestEnemies::new();
    enemies.add(9, Vec2::new(4.5, 0.5), Vec2::ZERO);
    enemies.add(7, Vec2::new(0.5, 2.5), Vec2::ZERO);
    enemies.add(3, Vec2::new(2.5, 0.5), Vec2::ZERO);

    run_with_enemies(&mut engine, &world, &enemies, 1);
    let shots = engine.drain_projectiles();
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].target, EnemyId(3));
}

#[test]
fn turret_leads_moving_targets() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let turret = world.place(&mut engine, fx.turret, pos(0, 0), Rotation::None);
    engine.insert_item(turret, fx.bullet);

    let mut enemies = TestEnemies::new();
    enemies.add(1, Vec2::new(3.5, 0.5), Vec2::new(0.0, 1.0));

    run_with_enemies(&mut engine, &world, &enemies, 1);
    let shot = engine.drain_projectiles().remove(0);
    assert_eq!(shot.origin, Vec2::new(0.5, 0.5));
    // Three units at speed 10 takes 0.3s, during which the enemy moves 0.3.
    assert!((shot.aim_point - Vec2::new(3.5, 0.8)).length() < 1e-4);
    assert!((shot.direction.length() - 1.0).abs() < 1e-4);
    assert!(shot.direction.y > 0.0);
}

#[test]
fn turret_rejects_non_ammo() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let turret = world.place(&mut engine, fx.turret, pos(0, 0), Rotation::None);
    assert!(!engine.insert_item(turret, fx.iron_ore));
    assert!(engine.insert_item(turret, fx.bullet));
}

#[test]
fn turret_loads_from_belt_until_full() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    world.place(&mut engine, fx.ammo_source, pos(0, 0), Rotation::None);
    let belt = world.place(&mut engine, fx.fast_conveyor, pos(1, 0), Rotation::Cw90);
    let turret = world.place(&mut engine, fx.turret, pos(2, 0), Rotation::None);

    run(&mut engine, &world, 200);

    assert_eq!(engine.turret_snapshot(turret).unwrap().ammo, 20);
    assert_eq!(belt_items(&engine, belt), vec![Some(fx.bullet), Some(fx.bullet)]);
}

// ===========================================================================
// Engine surface
// ===========================================================================

#[test]
fn identical_runs_hash_identically() {
    let build = |extra: bool| {
        let fx = fixture();
        let mut engine = fx.engine();
        let mut world = TestWorld::with_default_terrain(fx.ore_field);
        world.place(&mut engine, fx.drill, pos(0, 0), Rotation::None);
        world.place(&mut engine, fx.conveyor, pos(1, 0), Rotation::Cw90);
        world.place(&mut engine, fx.storage, pos(2, 0), Rotation::None);
        if extra {
            world.place(&mut engine, fx.drill, pos(2, 1), Rotation::None);
        }
        run(&mut engine, &world, 300);
        engine.state_hash()
    };
    assert_eq!(build(false), build(false));
    assert_ne!(build(false), build(true));
}

#[test]
fn lifecycle_events_are_delivered() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let registered = Rc::new(RefCell::new(0u32));
    let unregistered = Rc::new(RefCell::new(0u32));
    let r = registered.clone();
    let u = unregistered.clone();
    engine.on_passive(EventKind::BuildingRegistered, Box::new(move |_| *r.borrow_mut() += 1));
    engine.on_passive(EventKind::BuildingUnregistered, Box::new(move |_| *u.borrow_mut() += 1));

    let chest = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    world.place(&mut engine, fx.conveyor, pos(3, 0), Rotation::None);
    world.place(&mut engine, fx.wall, pos(6, 0), Rotation::None);
    run(&mut engine, &world, 1);
    assert_eq!(*registered.borrow(), 2);

    world.remove(&mut engine, chest);
    run(&mut engine, &world, 1);
    assert_eq!(*unregistered.borrow(), 1);
}

#[test]
fn suppressed_transfers_are_not_recorded() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    engine.suppress_event(EventKind::ItemTransferred);
    let chest = world.place(&mut engine, fx.storage, pos(0, 0), Rotation::None);
    let depot = world.place(&mut engine, fx.depot, pos(1, 0), Rotation::None);
    assert!(engine.inventory_mut(chest).unwrap().add(fx.iron_ore, 3));

    run(&mut engine, &world, 5);
    assert_eq!(stored(&engine, depot, fx.iron_ore), 3);
    assert_eq!(engine.events().total_emitted(EventKind::ItemTransferred), 0);
}

#[test]
fn logics_of_filters_by_variant() {
    let fx = fixture();
    let mut engine = fx.engine();
    let mut world = TestWorld::new();
    let a = world.place(&mut engine, fx.conveyor, pos(0, 0), Rotation::None);
    world.place(&mut engine, fx.storage, pos(1, 0), Rotation::None);
    let b = world.place(&mut engine, fx.fast_conveyor, pos(2, 0), Rotation::None);
    world.place(&mut engine, fx.splitter, pos(3, 0), Rotation::None);

    let conveyors: Vec<_> = engine.logics_of(LogicKind::Conveyor).map(|(id, _)| id).collect();
    assert_eq!(conveyors, vec![a, b]);
    assert_eq!(engine.belt_snapshots().len(), 3);
}
