//! Shooter and chaser enemies.
//!
//! Both kinds are spawned at random points inside the map margin and fall
//! under double gravity (their body gravity equals the world gravity). A hit
//! from a player bullet deactivates an enemy: it is hidden, its body stops
//! simulating and any timer it owns is removed in the same call.

use glam::Vec2;
use hs_core::timer::{TimerHandle, TimerScheduler};
use rand::Rng;

use crate::body::{Aabb, ArcadeBody};
use crate::config::GameConfig;
use crate::tilemap::Tilemap;

const SPAWN_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone)]
pub struct Shooter {
    pub body: ArcadeBody,
    pub fire_rate_ms: u64,
    pub active: bool,
    pub fire_timer: Option<TimerHandle>,
}

impl Shooter {
    pub fn new(position: Vec2, fire_rate_ms: u64, config: &GameConfig) -> Self {
        Self {
            body: enemy_body(position, config),
            fire_rate_ms,
            active: true,
            fire_timer: None,
        }
    }

    pub fn deactivate<E: Copy>(&mut self, timers: &mut TimerScheduler<E>) {
        self.active = false;
        self.body.velocity = Vec2::ZERO;
        if let Some(handle) = self.fire_timer.take() {
            timers.remove(handle);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chaser {
    pub body: ArcadeBody,
    pub active: bool,
    /// Latched on first contact with the player; never cleared.
    pub collided: bool,
}

impl Chaser {
    pub fn new(position: Vec2, config: &GameConfig) -> Self {
        Self {
            body: enemy_body(position, config),
            active: true,
            collided: false,
        }
    }

    /// Heads straight for `target` at `speed` while it is within `range`.
    /// Out of range the current velocity is left alone.
    pub fn chase(&mut self, target: Vec2, range: f32, speed: f32) {
        if let Some(velocity) = aim(self.body.position, target, range, speed) {
            self.body.velocity = velocity;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.body.velocity = Vec2::ZERO;
    }
}

fn enemy_body(position: Vec2, config: &GameConfig) -> ArcadeBody {
    let mut body = ArcadeBody::new(position, Vec2::from(config.enemy_size));
    body.collide_world_bounds = true;
    body.gravity.y = config.gravity;
    body
}

/// Velocity of magnitude `speed` from `from` toward `to`, or `None` when the
/// target is not strictly closer than `range`.
pub fn aim(from: Vec2, to: Vec2, range: f32, speed: f32) -> Option<Vec2> {
    let offset = to - from;
    if offset.length() >= range {
        return None;
    }
    let angle = offset.y.atan2(offset.x);
    Some(Vec2::new(angle.cos(), angle.sin()) * speed)
}

pub fn roll_fire_rate<R: Rng>(rng: &mut R, config: &GameConfig) -> u64 {
    if rng.gen_bool(0.5) {
        config.fire_rate_normal_ms
    } else {
        config.fire_rate_fast_ms
    }
}

/// Integer position in `[margin, size - margin]` on both axes. A roll that
/// lands inside solid tiles is retried a few times before being accepted.
pub fn roll_spawn_point<R: Rng>(rng: &mut R, map: &Tilemap, size: Vec2, margin: f32) -> Vec2 {
    let mut point = Vec2::ZERO;
    for _ in 0..SPAWN_ATTEMPTS {
        point = Vec2::new(
            roll_axis(rng, margin, map.width_in_pixels() - margin),
            roll_axis(rng, margin, map.height_in_pixels() - margin),
        );
        if !map.overlaps_solid(Aabb::from_center_size(point, size)) {
            return point;
        }
    }
    log::debug!("Spawn at ({}, {}) overlaps solid tiles", point.x, point.y);
    point
}

fn roll_axis<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    let (lo, hi) = (min.floor() as i64, max.floor() as i64);
    if hi <= lo {
        return ((min + max) * 0.5).max(0.0);
    }
    rng.gen_range(lo..=hi) as f32
}
