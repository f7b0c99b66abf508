use std::collections::VecDeque;

use glam::Vec2;
use tracing::trace;

use super::{BuildingFrame, ConfigError, ItemAcceptor};
use crate::context::TickContext;
use crate::fixed::Ticks;
use crate::id::{BuildingId, EnemyId, ItemTypeId, ProjectileTypeId};
use crate::registry::{Item, TurretConfig};
use crate::world::EnemySnapshot;

/// Everything the projectile system needs to spawn one shot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpawn {
    pub turret: BuildingId,
    pub projectile: ProjectileTypeId,
    pub target: EnemyId,
    pub origin: Vec2,
    /// Unit vector toward `aim_point`.
    pub direction: Vec2,
    /// Where the target is expected to be when the shot arrives.
    pub aim_point: Vec2,
    pub speed: f32,
    pub damage: u32,
    pub collision_radius: f32,
    pub lifetime: f32,
    pub penetration: u32,
    pub tick: Ticks,
}

/// Loads ammo from belts and fires at the nearest enemy in range.
#[derive(Debug, Clone)]
pub struct TurretLogic {
    range: f32,
    reload_ticks: Ticks,
    max_ammo: usize,
    allowed: Vec<ProjectileTypeId>,
    ammo: VecDeque<ItemTypeId>,
    countdown: Ticks,
}

impl TurretLogic {
    pub fn new(config: &TurretConfig) -> Result<Self, ConfigError> {
        ConfigError::at_least("max_ammo", 1, config.max_ammo as u64)?;
        if config.range.is_nan() || config.range <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "range",
                value: f64::from(config.range),
            });
        }
        Ok(Self {
            range: config.range,
            reload_ticks: config.reload_ticks,
            max_ammo: config.max_ammo,
            allowed: config.projectiles.clone(),
            ammo: VecDeque::with_capacity(config.max_ammo),
            countdown: 0,
        })
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn ammo(&self) -> impl Iterator<Item = ItemTypeId> + '_ {
        self.ammo.iter().copied()
    }

    pub fn ammo_len(&self) -> usize {
        self.ammo.len()
    }

    pub fn max_ammo(&self) -> usize {
        self.max_ammo
    }

    /// Ticks until the turret may fire again.
    pub fn countdown(&self) -> Ticks {
        self.countdown
    }

    pub(crate) fn tick(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        if self.countdown > 0 {
            self.countdown -= 1;
        }
        if self.countdown > 0 {
            return;
        }
        let Some(&ammo) = self.ammo.front() else {
            return;
        };
        let Some(projectile) = ctx.registry.get_item(ammo).and_then(|def| def.projectile) else {
            return;
        };
        let Some(stats) = ctx.registry.get_projectile(projectile) else {
            return;
        };

        let origin = frame.center();
        let enemies = ctx.env.enemies.enemies_in_radius(origin, self.range);
        let Some(target) = nearest_enemy(origin, self.range, &enemies) else {
            return;
        };

        let distance = origin.distance(target.position);
        let flight_time = if stats.speed > 0.0 {
            distance / stats.speed
        } else {
            0.0
        };
        let aim_point = target.position + target.velocity * flight_time;

        self.ammo.pop_front();
        self.countdown = self.reload_ticks;

        let spawn = ProjectileSpawn {
            turret: frame.id,
            projectile,
            target: target.id,
            origin,
            direction: (aim_point - origin).normalize_or_zero(),
            aim_point,
            speed: stats.speed,
            damage: stats.damage,
            collision_radius: stats.collision_radius,
            lifetime: stats.lifetime,
            penetration: stats.penetration,
            tick: ctx.tick,
        };
        trace!(turret = ?frame.id, target = ?target.id, "turret fired");
        ctx.spawn_projectile(spawn);
    }
}

/// Closest enemy within `range`; ties go to the lower id.
fn nearest_enemy(origin: Vec2, range: f32, enemies: &[EnemySnapshot]) -> Option<EnemySnapshot> {
    let range_sq = range * range;
    enemies
        .iter()
        .map(|e| (origin.distance_squared(e.position), e))
        .filter(|(d, _)| *d <= range_sq)
        .min_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)))
        .map(|(_, e)| *e)
}

impl ItemAcceptor for TurretLogic {
    fn can_accept(&self, item: Item<'_>) -> bool {
        item.def.is_ammo
            && item
                .def
                .projectile
                .is_some_and(|p| self.allowed.contains(&p))
            && self.ammo.len() < self.max_ammo
    }

    fn insert(&mut self, item: Item<'_>) -> bool {
        if !self.can_accept(item) {
            return false;
        }
        self.ammo.push_back(item.id);
        true
    }
}
