//! Arcade bodies: axis-aligned boxes with velocity, acceleration, drag, gravity
//! and a velocity cap. No rotation, no mass.
//!
//! Per-axis integration order for one step:
//!   1. gravity (world + body) if allowed
//!   2. acceleration, or linear drag toward zero when acceleration is zero
//!   3. clamp to `max_velocity`
//!   4. move against the tile layer, then against the world bounds
//!
//! Velocity on an axis is zeroed when the move on that axis was blocked.

use glam::Vec2;

use crate::tilemap::{Blocked, TileContact, Tilemap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w: size.x * 0.5,
            half_h: size.y * 0.5,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (self.center_x - other.center_x).abs() < self.half_w + other.half_w
            && (self.center_y - other.center_y).abs() < self.half_h + other.half_h
    }
}

#[derive(Debug, Clone)]
pub struct ArcadeBody {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag: Vec2,
    pub max_velocity: Vec2,
    /// Added on top of world gravity.
    pub gravity: Vec2,
    pub allow_gravity: bool,
    pub collide_world_bounds: bool,
    pub blocked: Blocked,
}

impl ArcadeBody {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            max_velocity: Vec2::splat(10_000.0),
            gravity: Vec2::ZERO,
            allow_gravity: true,
            collide_world_bounds: false,
            blocked: Blocked::default(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }

    /// Integrates one step and resolves against `map`. Returns every tile the
    /// body ended up touching, in the order they were hit.
    pub fn step(&mut self, dt: f32, world_gravity: Vec2, map: Option<&Tilemap>) -> Vec<TileContact> {
        let gravity = if self.allow_gravity {
            world_gravity + self.gravity
        } else {
            Vec2::ZERO
        };

        self.velocity.x = integrate_axis(
            self.velocity.x,
            gravity.x,
            self.acceleration.x,
            self.drag.x,
            self.max_velocity.x,
            dt,
        );
        self.velocity.y = integrate_axis(
            self.velocity.y,
            gravity.y,
            self.acceleration.y,
            self.drag.y,
            self.max_velocity.y,
            dt,
        );

        let delta = self.velocity * dt;
        let (contacts, mut blocked) = match map {
            Some(map) => {
                let result = map.move_and_collide(self.aabb(), delta.x, delta.y);
                self.position = Vec2::new(result.aabb.center_x, result.aabb.center_y);
                (result.contacts, result.blocked)
            }
            None => {
                self.position += delta;
                (Vec::new(), Blocked::default())
            }
        };

        if self.collide_world_bounds {
            if let Some(map) = map {
                let bounds = Vec2::new(map.width_in_pixels(), map.height_in_pixels());
                blocked = self.clamp_to_bounds(bounds, blocked);
            }
        }

        if (blocked.left && self.velocity.x < 0.0) || (blocked.right && self.velocity.x > 0.0) {
            self.velocity.x = 0.0;
        }
        if (blocked.up && self.velocity.y < 0.0) || (blocked.down && self.velocity.y > 0.0) {
            self.velocity.y = 0.0;
        }
        self.blocked = blocked;
        contacts
    }

    fn clamp_to_bounds(&mut self, bounds: Vec2, mut blocked: Blocked) -> Blocked {
        let half = self.size * 0.5;
        if self.position.x - half.x <= 0.0 {
            self.position.x = half.x;
            blocked.left = true;
        } else if self.position.x + half.x >= bounds.x {
            self.position.x = bounds.x - half.x;
            blocked.right = true;
        }
        if self.position.y - half.y <= 0.0 {
            self.position.y = half.y;
            blocked.up = true;
        } else if self.position.y + half.y >= bounds.y {
            self.position.y = bounds.y - half.y;
            blocked.down = true;
        }
        blocked
    }

    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        let half = self.size * 0.5;
        self.position.x + half.x < 0.0
            || self.position.x - half.x > width
            || self.position.y + half.y < 0.0
            || self.position.y - half.y > height
    }
}

fn integrate_axis(velocity: f32, gravity: f32, acceleration: f32, drag: f32, max: f32, dt: f32) -> f32 {
    let mut v = velocity + gravity * dt;
    if acceleration != 0.0 {
        v += acceleration * dt;
    } else if drag != 0.0 {
        let amount = drag * dt;
        if v - amount > 0.0 {
            v -= amount;
        } else if v + amount < 0.0 {
            v += amount;
        } else {
            v = 0.0;
        }
    }
    v.clamp(-max, max)
}

/// Pushes two overlapping movable bodies apart along the axis of least
/// penetration and gives both the mean velocity on that axis. Each body takes
/// half the overlap; when `map` blocks one of them the other takes the rest, so
/// neither is ever pushed into a solid tile. Returns false if they were not
/// overlapping.
pub fn separate(a: &mut ArcadeBody, b: &mut ArcadeBody, map: Option<&Tilemap>) -> bool {
    let (box_a, box_b) = (a.aabb(), b.aabb());
    if !box_a.intersects(&box_b) {
        return false;
    }

    let overlap_x = box_a.half_w + box_b.half_w - (box_a.center_x - box_b.center_x).abs();
    let overlap_y = box_a.half_h + box_b.half_h - (box_a.center_y - box_b.center_y).abs();

    let (axis, overlap) = if overlap_x < overlap_y {
        let dir = if box_a.center_x < box_b.center_x { -1.0 } else { 1.0 };
        (Vec2::new(dir, 0.0), overlap_x)
    } else {
        let dir = if box_a.center_y < box_b.center_y { -1.0 } else { 1.0 };
        (Vec2::new(0.0, dir), overlap_y)
    };

    let moved_a = push(a, axis * (overlap * 0.5), map);
    let moved_b = push(b, -axis * (overlap - moved_a), map);
    let rest = overlap - moved_a - moved_b;
    if rest > 0.0001 {
        push(a, axis * rest, map);
    }

    if axis.x != 0.0 {
        let mean = (a.velocity.x + b.velocity.x) * 0.5;
        a.velocity.x = mean;
        b.velocity.x = mean;
    } else {
        let mean = (a.velocity.y + b.velocity.y) * 0.5;
        a.velocity.y = mean;
        b.velocity.y = mean;
    }
    true
}

/// Moves `body` by `delta` against the tile layer and returns the distance
/// actually covered.
fn push(body: &mut ArcadeBody, delta: Vec2, map: Option<&Tilemap>) -> f32 {
    let before = body.position;
    match map {
        Some(map) => {
            let result = map.move_and_collide(body.aabb(), delta.x, delta.y);
            body.position = Vec2::new(result.aabb.center_x, result.aabb.center_y);
        }
        None => body.position += delta,
    }
    body.position.distance(before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::tests::test_level;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn drag_decays_velocity_only_without_acceleration() {
        let mut body = ArcadeBody::new(Vec2::new(100.0, 50.0), Vec2::splat(16.0));
        body.allow_gravity = false;
        body.drag.x = 300.0;
        body.velocity.x = 100.0;
        body.step(DT, Vec2::ZERO, None);
        assert!((body.velocity.x - 95.0).abs() < 0.001);

        body.acceleration.x = 600.0;
        body.step(DT, Vec2::ZERO, None);
        assert!((body.velocity.x - 105.0).abs() < 0.001);
    }

    #[test]
    fn drag_stops_at_zero_without_overshoot() {
        let mut body = ArcadeBody::new(Vec2::ZERO, Vec2::splat(16.0));
        body.allow_gravity = false;
        body.drag.x = 300.0;
        body.velocity.x = -3.0;
        body.step(DT, Vec2::ZERO, None);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn velocity_is_capped() {
        let mut body = ArcadeBody::new(Vec2::ZERO, Vec2::splat(16.0));
        body.allow_gravity = false;
        body.max_velocity.x = 200.0;
        body.acceleration.x = 100_000.0;
        body.step(DT, Vec2::ZERO, None);
        assert_eq!(body.velocity.x, 200.0);
    }

    #[test]
    fn body_gravity_adds_to_world_gravity() {
        let mut body = ArcadeBody::new(Vec2::ZERO, Vec2::splat(16.0));
        body.gravity.y = 1500.0;
        body.step(0.1, Vec2::new(0.0, 1500.0), None);
        assert!((body.velocity.y - 300.0).abs() < 0.001);

        body.allow_gravity = false;
        body.velocity = Vec2::ZERO;
        body.step(0.1, Vec2::new(0.0, 1500.0), None);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn falling_body_lands_and_reports_floor() {
        let map = test_level();
        let mut body = ArcadeBody::new(Vec2::new(50.0, 100.0), Vec2::splat(16.0));
        for _ in 0..120 {
            body.step(DT, Vec2::new(0.0, 1500.0), Some(&map));
        }
        assert!(body.on_floor());
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.position.y - (11.0 * 18.0 - 8.0)).abs() < 0.01);
    }

    #[test]
    fn world_bounds_block_the_left_edge() {
        let map = test_level();
        let mut body = ArcadeBody::new(Vec2::new(20.0, 100.0), Vec2::splat(16.0));
        body.allow_gravity = false;
        body.collide_world_bounds = true;
        body.velocity.x = -1200.0;
        body.step(DT, Vec2::ZERO, Some(&map));
        assert_eq!(body.position.x, 8.0);
        assert!(body.blocked.left);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn separate_pushes_bodies_apart_on_the_shallow_axis() {
        let mut a = ArcadeBody::new(Vec2::new(0.0, 0.0), Vec2::splat(20.0));
        let mut b = ArcadeBody::new(Vec2::new(16.0, 2.0), Vec2::splat(20.0));
        a.velocity.x = 100.0;
        b.velocity.x = -300.0;
        assert!(separate(&mut a, &mut b, None));
        assert!(!a.aabb().intersects(&b.aabb()));
        assert!((a.position.x + 2.0).abs() < 0.001);
        assert!((b.position.x - 18.0).abs() < 0.001);
        assert_eq!(a.velocity.x, -100.0);
        assert_eq!(b.velocity.x, -100.0);
    }

    #[test]
    fn separate_ignores_disjoint_bodies() {
        let mut a = ArcadeBody::new(Vec2::new(0.0, 0.0), Vec2::splat(10.0));
        let mut b = ArcadeBody::new(Vec2::new(50.0, 0.0), Vec2::splat(10.0));
        assert!(!separate(&mut a, &mut b, None));
        assert_eq!(a.position, Vec2::ZERO);
    }

    #[test]
    fn separate_never_pushes_a_body_into_a_wall() {
        let map = test_level();
        // Wall column 30 spans x 540..558 above the floor.
        let wall_left = 30.0 * 18.0;
        let y = 11.0 * 18.0 - 10.0;
        let mut flush = ArcadeBody::new(Vec2::new(wall_left - 9.0, y), Vec2::new(18.0, 20.0));
        let mut other = ArcadeBody::new(Vec2::new(wall_left - 21.0, y), Vec2::new(16.0, 20.0));

        assert!(separate(&mut flush, &mut other, Some(&map)));
        assert!(flush.position.x + 9.0 <= wall_left + 0.001);
        assert!(!map.overlaps_solid(flush.aabb()));
        assert!(!flush.aabb().intersects(&other.aabb()));
        assert!((other.position.x - (wall_left - 26.0)).abs() < 0.01);
    }
}
