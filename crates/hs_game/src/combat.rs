//! Pooled bullets for the player and for shooter enemies.
//!
//! Each owner has its own fixed-capacity pool. Firing with every slot in use
//! is a silent no-op. A bullet is released when it touches a collidable tile
//! or leaves the map; hit handling against bodies lives in the scene.

use glam::Vec2;
use hs_core::pool::{Pool, SlotId};

use crate::body::ArcadeBody;
use crate::config::GameConfig;
use crate::player::Facing;
use crate::tilemap::Tilemap;

#[derive(Debug, Clone)]
pub struct Bullet {
    pub body: ArcadeBody,
}

impl Bullet {
    fn launched(position: Vec2, velocity: Vec2, config: &GameConfig) -> Self {
        let mut body = ArcadeBody::new(position, Vec2::from(config.bullet_size));
        body.allow_gravity = false;
        body.velocity = velocity;
        Self { body }
    }
}

pub type BulletPool = Pool<Bullet>;

pub fn fire_player_bullet(
    pool: &mut BulletPool,
    position: Vec2,
    facing: Facing,
    config: &GameConfig,
) -> Option<SlotId> {
    let velocity = Vec2::new(facing.sign() * config.bullet_speed, 0.0);
    pool.acquire(Bullet::launched(position, velocity, config))
}

/// Launches along the angle from `from` to `target`.
pub fn fire_enemy_bullet(
    pool: &mut BulletPool,
    from: Vec2,
    target: Vec2,
    config: &GameConfig,
) -> Option<SlotId> {
    let offset = target - from;
    let angle = offset.y.atan2(offset.x);
    let velocity = Vec2::new(angle.cos(), angle.sin()) * config.bullet_speed;
    pool.acquire(Bullet::launched(from, velocity, config))
}

/// Moves every live bullet and releases those that hit the ground or left
/// the map. Returns how many were released.
pub fn step_bullets(pool: &mut BulletPool, dt: f32, map: &Tilemap) -> usize {
    let (width, height) = (map.width_in_pixels(), map.height_in_pixels());
    let mut spent = Vec::new();
    for (id, bullet) in pool.iter_mut() {
        let contacts = bullet.body.step(dt, Vec2::ZERO, Some(map));
        if !contacts.is_empty() || bullet.body.is_outside(width, height) {
            spent.push(id);
        }
    }
    for id in &spent {
        pool.release(*id);
    }
    spent.len()
}
