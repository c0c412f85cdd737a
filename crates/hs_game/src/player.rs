use glam::Vec2;
use hs_core::input::{InputState, Key};

use crate::body::ArcadeBody;
use crate::config::GameConfig;

/// Player intent for one fixed step, sampled from the keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    pub left: bool,
    pub right: bool,
    pub jump_pressed: bool,
    pub fire_pressed: bool,
    pub dash_pressed: bool,
    pub restart_held: bool,
    pub toggle_debug_pressed: bool,
}

impl PlayerIntent {
    pub fn from_input(input: &InputState) -> Self {
        Self {
            left: input.is_held(Key::Left),
            right: input.is_held(Key::Right),
            jump_pressed: input.is_just_pressed(Key::Up),
            fire_pressed: input.is_just_pressed(Key::Space),
            dash_pressed: input.is_just_pressed(Key::Shift),
            restart_held: input.is_held(Key::R),
            toggle_debug_pressed: input.is_just_pressed(Key::D),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Grounded,
    Airborne,
    DoubleJumped,
    Dashing,
}

impl PlayerState {
    pub fn label(self) -> &'static str {
        match self {
            PlayerState::Grounded => "Grounded",
            PlayerState::Airborne => "Airborne",
            PlayerState::DoubleJumped => "DoubleJumped",
            PlayerState::Dashing => "Dashing",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dash {
    pub until_us: u64,
    pub direction: Facing,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: ArcadeBody,
    pub health: i32,
    pub facing: Facing,
    pub jumps: u32,
    pub double_jumped: bool,
    pub dash: Option<Dash>,
    pub on_lava: bool,
}

impl Player {
    pub fn new(spawn: Vec2, config: &GameConfig) -> Self {
        let mut body = ArcadeBody::new(spawn, Vec2::from(config.player_size));
        body.collide_world_bounds = true;
        body.max_velocity.x = config.max_velocity_x;
        body.drag.x = config.drag;
        Self {
            body,
            health: config.max_health,
            facing: Facing::Right,
            jumps: 0,
            double_jumped: false,
            dash: None,
            on_lava: false,
        }
    }

    pub fn state(&self) -> PlayerState {
        if self.dash.is_some() {
            PlayerState::Dashing
        } else if self.body.on_floor() {
            PlayerState::Grounded
        } else if self.double_jumped {
            PlayerState::DoubleJumped
        } else {
            PlayerState::Airborne
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    /// Applies left/right input. Returns true when the player is walking on
    /// the floor this step. Input is ignored while a dash is in progress.
    pub fn apply_horizontal(&mut self, intent: &PlayerIntent, config: &GameConfig) -> bool {
        if self.is_dashing() {
            return false;
        }

        if intent.left {
            self.body.acceleration.x = -config.acceleration;
            self.facing = Facing::Left;
            self.body.on_floor()
        } else if intent.right {
            self.body.acceleration.x = config.acceleration;
            self.facing = Facing::Right;
            self.body.on_floor()
        } else {
            self.body.acceleration.x = 0.0;
            if self.body.velocity.x.abs() < config.idle_snap_speed {
                self.body.velocity.x = 0.0;
            }
            false
        }
    }

    pub fn try_jump(&mut self, config: &GameConfig) -> bool {
        let on_floor = self.body.on_floor();
        if !(on_floor || (self.jumps < config.max_jumps && !self.double_jumped)) {
            return false;
        }
        self.double_jumped = !on_floor;
        self.body.velocity.y = config.jump_velocity;
        self.jumps += 1;
        true
    }

    pub fn reset_jumps_if_grounded(&mut self) {
        if self.body.on_floor() {
            self.jumps = 0;
            self.double_jumped = false;
        }
    }

    /// Starts a dash in the facing direction. A press during a dash is ignored.
    pub fn start_dash(&mut self, now_us: u64, config: &GameConfig) -> bool {
        if self.is_dashing() {
            return false;
        }
        self.dash = Some(Dash {
            until_us: now_us + config.dash_duration_ms * 1000,
            direction: self.facing,
        });
        self.body.max_velocity.x = config.dash_velocity;
        self.body.velocity.x = self.facing.sign() * config.dash_velocity;
        self.body.acceleration.x = 0.0;
        self.body.drag.x = 0.0;
        true
    }

    /// Ends the dash once scene time has passed its expiry.
    pub fn update_dash(&mut self, now_us: u64, config: &GameConfig) -> bool {
        match self.dash {
            Some(dash) if now_us > dash.until_us => {
                self.dash = None;
                self.body.max_velocity.x = config.max_velocity_x;
                self.body.drag.x = config.drag;
                true
            }
            _ => false,
        }
    }

    /// Returns true when this hit leaves the player at or below zero health.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health -= amount;
        self.health <= 0
    }

    pub fn health_text(&self) -> String {
        format!("HP: {}", self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::tests::test_level;

    const DT: f32 = 1.0 / 60.0;
    const DT_US: u64 = hs_core::time::FIXED_DT_US;

    fn gravity(config: &GameConfig) -> Vec2 {
        Vec2::new(0.0, config.gravity)
    }

    fn grounded_player(config: &GameConfig) -> (Player, crate::tilemap::Tilemap) {
        let map = test_level();
        let mut player = Player::new(Vec2::new(100.0, 150.0), config);
        for _ in 0..60 {
            player.body.step(DT, gravity(config), Some(&map));
        }
        assert!(player.body.on_floor());
        (player, map)
    }

    #[test]
    fn idle_velocity_below_threshold_snaps_to_zero() {
        let config = GameConfig::default();
        let (mut player, map) = grounded_player(&config);
        player.body.velocity.x = 60.0;
        let intent = PlayerIntent::default();
        let mut previous = player.body.velocity.x;
        for _ in 0..30 {
            player.body.step(DT, gravity(&config), Some(&map));
            player.apply_horizontal(&intent, &config);
            assert!(player.body.velocity.x <= previous);
            previous = player.body.velocity.x;
        }
        assert_eq!(player.body.velocity.x, 0.0);
    }

    #[test]
    fn held_input_never_exceeds_the_cap() {
        let config = GameConfig::default();
        let mut player = Player::new(Vec2::ZERO, &config);
        player.body.allow_gravity = false;
        let intent = PlayerIntent {
            right: true,
            ..PlayerIntent::default()
        };
        for _ in 0..300 {
            player.apply_horizontal(&intent, &config);
            player.body.step(DT, Vec2::ZERO, None);
            assert!(player.body.velocity.x.abs() <= config.max_velocity_x);
        }
        assert_eq!(player.body.velocity.x, config.max_velocity_x);
        assert_eq!(player.facing, Facing::Right);
    }

    #[test]
    fn at_most_two_jumps_before_landing() {
        let config = GameConfig::default();
        let (mut player, map) = grounded_player(&config);

        assert!(player.try_jump(&config));
        assert!(!player.double_jumped);
        // Still reported on the floor this step, so the counter resets.
        player.reset_jumps_if_grounded();
        player.body.step(DT, gravity(&config), Some(&map));
        assert!(!player.body.on_floor());

        assert!(player.try_jump(&config));
        assert!(player.double_jumped);
        assert_eq!(player.state(), PlayerState::DoubleJumped);
        player.body.step(DT, gravity(&config), Some(&map));

        let vy = player.body.velocity.y;
        assert!(!player.try_jump(&config));
        assert_eq!(player.body.velocity.y, vy);
    }

    #[test]
    fn landing_resets_jump_state() {
        let config = GameConfig::default();
        let (mut player, map) = grounded_player(&config);
        player.try_jump(&config);
        player.body.step(DT, gravity(&config), Some(&map));
        player.try_jump(&config);
        for _ in 0..240 {
            player.body.step(DT, gravity(&config), Some(&map));
            player.reset_jumps_if_grounded();
        }
        assert!(player.body.on_floor());
        assert_eq!(player.jumps, 0);
        assert!(!player.double_jumped);
        assert_eq!(player.state(), PlayerState::Grounded);
    }

    #[test]
    fn dash_holds_speed_for_its_duration_then_restores_drag() {
        let config = GameConfig::default();
        let mut player = Player::new(Vec2::ZERO, &config);
        player.body.allow_gravity = false;
        player.facing = Facing::Left;

        let mut now = 0;
        assert!(player.start_dash(now, &config));
        let until = now + config.dash_duration_ms * 1000;
        let pushing_right = PlayerIntent {
            right: true,
            ..PlayerIntent::default()
        };

        while now <= until {
            player.apply_horizontal(&pushing_right, &config);
            player.body.step(DT, Vec2::ZERO, None);
            now += DT_US;
            assert!(!player.start_dash(now, &config));
            if !player.update_dash(now, &config) {
                assert_eq!(player.body.velocity.x, -config.dash_velocity);
                assert_eq!(player.facing, Facing::Left);
            }
        }

        assert!(!player.is_dashing());
        assert_eq!(player.body.max_velocity.x, config.max_velocity_x);
        assert_eq!(player.body.drag.x, config.drag);
    }

    #[test]
    fn damage_reports_crossing_zero() {
        let config = GameConfig::default();
        let mut player = Player::new(Vec2::ZERO, &config);
        assert!(!player.take_damage(90));
        assert_eq!(player.health_text(), "HP: 10");
        assert!(player.take_damage(20));
        assert_eq!(player.health_text(), "HP: -10");
    }
}
