//! The level scene.
//!
//! One `update` is one fixed step, in three phases:
//!   1. timers fire and their payloads are dispatched
//!   2. bodies move, then overlaps and colliders run their callbacks
//!   3. per-step logic reads the player intent and advances the state machines
//!
//! Scene changes (restart, victory) are requested rather than applied; the
//! first request in a step wins and is handed back to the caller.

use std::rc::Rc;

use glam::Vec2;
use hs_core::timer::{TimerConfig, TimerHandle, TimerScheduler};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::body::{separate, Aabb};
use crate::combat::{fire_enemy_bullet, fire_player_bullet, step_bullets, BulletPool};
use crate::config::GameConfig;
use crate::enemy::{roll_fire_rate, roll_spawn_point, Chaser, Shooter};
use crate::game::SceneRequest;
use crate::particles::{EmitterConfig, EmitterId, ParticleSystem};
use crate::player::{Player, PlayerIntent};
use crate::tilemap::{TileContact, Tilemap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTimer {
    LavaDamage,
    EnemyFire(usize),
    DestroyEmitter(EmitterId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coin {
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy)]
enum EnemyRef {
    Shooter(usize),
    Chaser(usize),
}

pub struct PlatformerScene {
    config: GameConfig,
    map: Rc<Tilemap>,
    rng: StdRng,
    now_us: u64,
    timers: TimerScheduler<SceneTimer>,
    lava_timer: TimerHandle,
    player: Player,
    shooters: Vec<Shooter>,
    chasers: Vec<Chaser>,
    player_bullets: BulletPool,
    enemy_bullets: BulletPool,
    coins: Vec<Coin>,
    coins_collected: u32,
    particles: ParticleSystem,
    walking_vfx: EmitterId,
    health_text: String,
    physics_debug: bool,
    pending: Option<SceneRequest>,
}

impl PlatformerScene {
    pub fn new(config: &GameConfig, map: Rc<Tilemap>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut timers = TimerScheduler::new();
        let lava_timer = timers.add(
            TimerConfig::repeating_ms(config.lava_tick_ms).paused(),
            SceneTimer::LavaDamage,
        );

        let spawn = Vec2::new(map.player_spawn.x, map.player_spawn.y);
        let player = Player::new(spawn, config);

        let coins: Vec<Coin> = map
            .objects_named("coin")
            .map(|o| Coin {
                position: Vec2::new(o.x, o.y),
            })
            .collect();

        let enemy_size = Vec2::from(config.enemy_size);
        let mut shooters = Vec::with_capacity(config.shooter_count);
        for _ in 0..config.shooter_count {
            let position = roll_spawn_point(&mut rng, &map, enemy_size, config.spawn_margin);
            let fire_rate_ms = roll_fire_rate(&mut rng, config);
            shooters.push(Shooter::new(position, fire_rate_ms, config));
        }
        for (index, shooter) in shooters.iter_mut().enumerate() {
            let handle = timers.add(
                TimerConfig::repeating_ms(shooter.fire_rate_ms),
                SceneTimer::EnemyFire(index),
            );
            shooter.fire_timer = Some(handle);
        }

        let chasers = (0..config.chaser_count)
            .map(|_| {
                let position = roll_spawn_point(&mut rng, &map, enemy_size, config.spawn_margin);
                Chaser::new(position, config)
            })
            .collect::<Vec<_>>();

        let mut particles = ParticleSystem::new();
        let walking_vfx =
            particles.add_emitter(EmitterConfig::walking(config.particle_velocity), spawn);

        log::info!(
            "Level '{}' started: {} shooters, {} chasers, {} coins",
            map.level_id,
            shooters.len(),
            chasers.len(),
            coins.len()
        );

        let health_text = player.health_text();
        Self {
            config: config.clone(),
            player_bullets: BulletPool::with_capacity(config.bullet_pool_size),
            enemy_bullets: BulletPool::with_capacity(config.bullet_pool_size),
            map,
            rng,
            now_us: 0,
            timers,
            lava_timer,
            player,
            shooters,
            chasers,
            coins,
            coins_collected: 0,
            particles,
            walking_vfx,
            health_text,
            physics_debug: false,
            pending: None,
        }
    }

    pub fn update(&mut self, intent: &PlayerIntent, dt_us: u64) -> Option<SceneRequest> {
        self.now_us += dt_us;
        self.run_timers(dt_us);
        self.step_physics(dt_us);
        self.step_logic(intent);
        self.pending.take()
    }

    fn request(&mut self, request: SceneRequest) {
        if self.pending.is_none() {
            self.pending = Some(request);
        }
    }

    fn run_timers(&mut self, dt_us: u64) {
        for fired in self.timers.advance(dt_us) {
            match fired {
                SceneTimer::LavaDamage => self.apply_lava_damage(),
                SceneTimer::EnemyFire(index) => self.enemy_shoot(index),
                SceneTimer::DestroyEmitter(id) => {
                    self.particles.destroy(id);
                }
            }
        }
    }

    fn step_physics(&mut self, dt_us: u64) {
        let dt = dt_us as f32 / 1_000_000.0;
        let gravity = Vec2::new(0.0, self.config.gravity);

        let contacts = self.player.body.step(dt, gravity, Some(&*self.map));
        for contact in contacts {
            self.handle_ground_contact(contact);
        }

        for shooter in self.shooters.iter_mut().filter(|s| s.active) {
            shooter.body.step(dt, gravity, Some(&*self.map));
        }
        for chaser in self.chasers.iter_mut().filter(|c| c.active) {
            chaser.body.step(dt, gravity, Some(&*self.map));
        }
        step_bullets(&mut self.player_bullets, dt, &self.map);
        step_bullets(&mut self.enemy_bullets, dt, &self.map);

        self.collect_coins();
        self.resolve_player_bullet_hits(false);
        self.resolve_enemy_bullet_hits();
        self.resolve_player_bullet_hits(true);
        self.resolve_chaser_contacts();

        self.particles.update(dt_us, &mut self.rng);
    }

    fn step_logic(&mut self, intent: &PlayerIntent) {
        let target = self.player.body.position;
        for chaser in self.chasers.iter_mut().filter(|c| c.active) {
            chaser.chase(target, self.config.enemy_range, self.config.chaser_speed);
        }

        if self.player.apply_horizontal(intent, &self.config) {
            let body = &self.player.body;
            let feet = body.position + Vec2::new(0.0, body.size.y * 0.5);
            self.particles.emit(
                self.walking_vfx,
                self.config.walking_particles_per_step,
                feet,
                &mut self.rng,
            );
        }

        if intent.jump_pressed && self.player.try_jump(&self.config) {
            log::trace!("Jump {} (double: {})", self.player.jumps, self.player.double_jumped);
        }
        self.player.reset_jumps_if_grounded();

        if intent.fire_pressed {
            let fired = fire_player_bullet(
                &mut self.player_bullets,
                self.player.body.position,
                self.player.facing,
                &self.config,
            );
            if fired.is_none() {
                log::trace!("Player bullet pool exhausted");
            }
        }

        if intent.dash_pressed && self.player.start_dash(self.now_us, &self.config) {
            let vfx = self
                .particles
                .add_emitter(EmitterConfig::dash(), self.player.body.position);
            self.timers.add(
                TimerConfig::once_ms(self.config.dash_duration_ms),
                SceneTimer::DestroyEmitter(vfx),
            );
            log::debug!("Dash {:?}", self.player.facing);
        }
        if self.player.update_dash(self.now_us, &self.config) {
            log::trace!("Dash finished");
        }

        if intent.toggle_debug_pressed {
            self.toggle_physics_debug();
        }
        if intent.restart_held {
            self.request(SceneRequest::Restart);
        }
        self.check_for_victory();
    }

    fn handle_ground_contact(&mut self, contact: TileContact) {
        if contact.is_lava {
            if !self.player.on_lava {
                self.player.on_lava = true;
                self.timers.set_paused(self.lava_timer, false);
                log::debug!("Player stepped onto lava");
            }
        } else if self.player.on_lava {
            self.player.on_lava = false;
            self.timers.set_paused(self.lava_timer, true);
            log::debug!("Player left lava");
        }
    }

    fn apply_lava_damage(&mut self) {
        if self.player.on_lava {
            self.damage_player(self.config.lava_damage, "lava");
        }
    }

    fn damage_player(&mut self, amount: i32, source: &str) {
        let dead = self.player.take_damage(amount);
        self.health_text = self.player.health_text();
        log::debug!(
            "Player took {amount} damage from {source}, health {}",
            self.player.health
        );
        if dead {
            log::info!("Player died, restarting level");
            self.request(SceneRequest::Restart);
        }
    }

    fn enemy_shoot(&mut self, index: usize) {
        let Some(shooter) = self.shooters.get(index) else {
            log::warn!("Fire timer for unknown shooter {index}");
            return;
        };
        if !shooter.active {
            return;
        }
        let from = shooter.body.position;
        let target = self.player.body.position;
        if from.distance(target) < self.config.enemy_range
            && fire_enemy_bullet(&mut self.enemy_bullets, from, target, &self.config).is_none()
        {
            log::trace!("Enemy bullet pool exhausted");
        }
    }

    fn collect_coins(&mut self) {
        let player_box = self.player.body.aabb();
        let coin_size = Vec2::from(self.config.coin_size);
        let before = self.coins.len();
        self.coins
            .retain(|coin| !Aabb::from_center_size(coin.position, coin_size).intersects(&player_box));
        let collected = (before - self.coins.len()) as u32;
        if collected > 0 {
            self.coins_collected += collected;
            log::debug!("Coin collected ({} total)", self.coins_collected);
        }
    }

    fn resolve_player_bullet_hits(&mut self, chasers: bool) {
        for id in self.player_bullets.active_ids() {
            let Some(bullet) = self.player_bullets.get(id) else {
                continue;
            };
            let hit_box = bullet.body.aabb();
            let target = if chasers {
                self.chasers
                    .iter()
                    .position(|c| c.active && c.body.aabb().intersects(&hit_box))
                    .map(EnemyRef::Chaser)
            } else {
                self.shooters
                    .iter()
                    .position(|s| s.active && s.body.aabb().intersects(&hit_box))
                    .map(EnemyRef::Shooter)
            };
            let Some(target) = target else {
                continue;
            };

            self.player_bullets.release(id);
            match target {
                EnemyRef::Shooter(index) => self.shooters[index].deactivate(&mut self.timers),
                EnemyRef::Chaser(index) => self.chasers[index].deactivate(),
            }
            log::debug!("Enemy {target:?} destroyed");
            self.check_for_victory();
        }
    }

    fn resolve_enemy_bullet_hits(&mut self) {
        let player_box = self.player.body.aabb();
        for id in self.enemy_bullets.active_ids() {
            let hit = self
                .enemy_bullets
                .get(id)
                .is_some_and(|b| b.body.aabb().intersects(&player_box));
            if hit {
                self.enemy_bullets.release(id);
                self.damage_player(self.config.bullet_damage, "enemy bullet");
            }
        }
    }

    fn resolve_chaser_contacts(&mut self) {
        for index in 0..self.chasers.len() {
            let chaser = &mut self.chasers[index];
            if !chaser.active {
                continue;
            }
            if !separate(&mut self.player.body, &mut chaser.body, Some(&*self.map)) {
                continue;
            }
            if chaser.collided {
                continue;
            }
            chaser.collided = true;
            chaser.body.velocity = Vec2::ZERO;
            self.damage_player(self.config.chaser_damage, "chaser");
        }
    }

    fn check_for_victory(&mut self) {
        if self.active_shooters() == 0 && self.active_chasers() == 0 {
            if self.pending.is_none() {
                log::info!("All enemies defeated");
            }
            self.request(SceneRequest::Victory);
        }
    }

    pub fn toggle_physics_debug(&mut self) {
        self.physics_debug = !self.physics_debug;
        log::info!(
            "Physics debug: {}",
            if self.physics_debug { "ON" } else { "OFF" }
        );
    }

    pub fn active_shooters(&self) -> usize {
        self.shooters.iter().filter(|s| s.active).count()
    }

    pub fn active_chasers(&self) -> usize {
        self.chasers.iter().filter(|c| c.active).count()
    }

    pub fn map(&self) -> &Tilemap {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn shooters(&self) -> &[Shooter] {
        &self.shooters
    }

    pub fn chasers(&self) -> &[Chaser] {
        &self.chasers
    }

    pub fn player_bullets(&self) -> &BulletPool {
        &self.player_bullets
    }

    pub fn enemy_bullets(&self) -> &BulletPool {
        &self.enemy_bullets
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    #[cfg(test)]
    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn health_text(&self) -> &str {
        &self.health_text
    }

    pub fn physics_debug(&self) -> bool {
        self.physics_debug
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    #[cfg(test)]
    pub(crate) fn chasers_mut(&mut self) -> &mut [Chaser] {
        &mut self.chasers
    }
}
