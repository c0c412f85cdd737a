//! Builds the per-frame quad mesh from the active scene.
//!
//! Everything is a flat-coloured quad over the white texture. Draw order is
//! back to front: tiles, coins, enemies, bullets, particles, player, then the
//! physics-body outlines when debug drawing is on.

use glam::Vec2;
use hs_render::QuadBatch;

use crate::body::ArcadeBody;
use crate::game::{ActiveScene, Game};
use crate::platformer::PlatformerScene;
use crate::player::PlayerState;

const DEFAULT_TILE_COLOR: [f32; 4] = [0.35, 0.3, 0.28, 1.0];
const COIN_COLOR: [f32; 4] = [1.0, 0.84, 0.1, 1.0];
const SHOOTER_COLOR: [f32; 4] = [0.75, 0.2, 0.85, 1.0];
const CHASER_COLOR: [f32; 4] = [0.9, 0.45, 0.1, 1.0];
const PLAYER_BULLET_COLOR: [f32; 4] = [1.0, 1.0, 0.6, 1.0];
const ENEMY_BULLET_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
const DEBUG_BODY_COLOR: [f32; 4] = [0.2, 1.0, 0.2, 0.9];
const DEBUG_VELOCITY_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 0.9];

pub fn build_mesh(game: &Game, batch: &mut QuadBatch) {
    batch.clear();
    match game.scene() {
        ActiveScene::Platformer(scene) => push_level(scene, batch),
        // The victory screen is text only; the overlay draws it.
        ActiveScene::Victory(_) => {}
    }
}

fn push_level(scene: &PlatformerScene, batch: &mut QuadBatch) {
    let map = scene.map();
    let tile = map.tile_size;
    for (x, y, props) in map.tiles_iter() {
        let color = props.color.unwrap_or(DEFAULT_TILE_COLOR);
        batch.push_rect([x + tile * 0.5, y + tile * 0.5], [tile, tile], color);
    }

    let coin_size = scene.config().coin_size;
    for coin in scene.coins() {
        batch.push_rect(coin.position.to_array(), coin_size, COIN_COLOR);
    }

    for shooter in scene.shooters().iter().filter(|s| s.active) {
        push_body(batch, &shooter.body, SHOOTER_COLOR);
    }
    for chaser in scene.chasers().iter().filter(|c| c.active) {
        push_body(batch, &chaser.body, CHASER_COLOR);
    }

    for (_, bullet) in scene.player_bullets().iter() {
        push_body(batch, &bullet.body, PLAYER_BULLET_COLOR);
    }
    for (_, bullet) in scene.enemy_bullets().iter() {
        push_body(batch, &bullet.body, ENEMY_BULLET_COLOR);
    }

    for sprite in scene.particles().sprites() {
        if sprite.size > 0.0 {
            batch.push_rect(sprite.position.to_array(), [sprite.size; 2], sprite.color);
        }
    }

    let player = scene.player();
    push_body(batch, &player.body, player_color(player.state(), player.health));

    if scene.physics_debug() {
        push_debug_bodies(scene, batch);
    }
}

fn push_body(batch: &mut QuadBatch, body: &ArcadeBody, color: [f32; 4]) {
    batch.push_rect(body.position.to_array(), body.size.to_array(), color);
}

/// Player tint by movement state, fading toward red as health drops.
fn player_color(state: PlayerState, health: i32) -> [f32; 4] {
    let base = match state {
        PlayerState::Grounded => [0.3, 0.75, 1.0],
        PlayerState::Airborne => [0.45, 0.85, 1.0],
        PlayerState::DoubleJumped => [0.6, 0.95, 1.0],
        PlayerState::Dashing => [1.0, 1.0, 1.0],
    };
    let hurt = 1.0 - (health.clamp(0, 100) as f32 / 100.0);
    [
        base[0] + (1.0 - base[0]) * hurt * 0.6,
        base[1] * (1.0 - hurt * 0.6),
        base[2] * (1.0 - hurt * 0.6),
        1.0,
    ]
}

fn push_debug_bodies(scene: &PlatformerScene, batch: &mut QuadBatch) {
    let mut bodies: Vec<&ArcadeBody> = vec![&scene.player().body];
    bodies.extend(scene.shooters().iter().filter(|s| s.active).map(|s| &s.body));
    bodies.extend(scene.chasers().iter().filter(|c| c.active).map(|c| &c.body));
    bodies.extend(scene.player_bullets().iter().map(|(_, b)| &b.body));
    bodies.extend(scene.enemy_bullets().iter().map(|(_, b)| &b.body));

    for body in bodies {
        batch.push_outline(
            body.position.to_array(),
            body.size.to_array(),
            1.0,
            DEBUG_BODY_COLOR,
        );
        // Short tick pointing along the velocity, one pixel per 10 px/s.
        let tip = body.position + body.velocity * 0.1;
        let mid = (body.position + tip) * 0.5;
        let extent = (tip - body.position).abs().max(Vec2::ONE);
        batch.push_rect(mid.to_array(), extent.to_array(), DEBUG_VELOCITY_COLOR);
    }
}
