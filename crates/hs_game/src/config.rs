//! Gameplay tuning loaded from `assets/config/tuning.json`.
//!
//! Every field has a default, so the file only needs to name what it changes.
//! The watcher polls the file's mtime the same way level assets are watched;
//! a reloaded config takes effect the next time the level starts.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub level_path: String,
    /// Fixed seed for enemy placement and particles. `None` seeds from the clock.
    pub seed: Option<u64>,

    pub gravity: f32,
    pub acceleration: f32,
    pub drag: f32,
    pub max_velocity_x: f32,
    pub idle_snap_speed: f32,
    pub jump_velocity: f32,
    pub max_jumps: u32,
    pub dash_velocity: f32,
    pub dash_duration_ms: u64,

    pub max_health: i32,
    pub bullet_damage: i32,
    pub chaser_damage: i32,
    pub lava_damage: i32,
    pub lava_tick_ms: u64,

    pub bullet_speed: f32,
    pub bullet_pool_size: usize,
    pub enemy_range: f32,
    pub fire_rate_normal_ms: u64,
    pub fire_rate_fast_ms: u64,
    pub chaser_speed: f32,
    pub shooter_count: usize,
    pub chaser_count: usize,
    pub spawn_margin: f32,

    pub player_size: [f32; 2],
    pub enemy_size: [f32; 2],
    pub bullet_size: [f32; 2],
    pub coin_size: [f32; 2],

    pub walking_particles_per_step: u32,
    pub particle_velocity: f32,

    pub camera_zoom: f32,
    pub camera_lerp: f32,
    pub camera_deadzone: [f32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level_path: "assets/levels/level1.json".to_string(),
            seed: None,
            gravity: 1500.0,
            acceleration: 2000.0,
            drag: 300.0,
            max_velocity_x: 2000.0,
            idle_snap_speed: 10.0,
            jump_velocity: -700.0,
            max_jumps: 2,
            dash_velocity: 200.0,
            dash_duration_ms: 200,
            max_health: 100,
            bullet_damage: 10,
            chaser_damage: 20,
            lava_damage: 10,
            lava_tick_ms: 1000,
            bullet_speed: 300.0,
            bullet_pool_size: 10,
            enemy_range: 200.0,
            fire_rate_normal_ms: 1000,
            fire_rate_fast_ms: 500,
            chaser_speed: 300.0,
            shooter_count: 4,
            chaser_count: 2,
            spawn_margin: 100.0,
            player_size: [18.0, 22.0],
            enemy_size: [28.0, 19.0],
            bullet_size: [8.0, 8.0],
            coin_size: [14.0, 14.0],
            walking_particles_per_step: 2,
            particle_velocity: 50.0,
            camera_zoom: 2.0,
            camera_lerp: 0.25,
            camera_deadzone: [50.0, 50.0],
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.level_path.trim().is_empty() {
        return Err("Config validation failed: level_path is empty".to_string());
    }

    let positive = [
        ("acceleration", config.acceleration),
        ("max_velocity_x", config.max_velocity_x),
        ("dash_velocity", config.dash_velocity),
        ("bullet_speed", config.bullet_speed),
        ("enemy_range", config.enemy_range),
        ("chaser_speed", config.chaser_speed),
        ("camera_zoom", config.camera_zoom),
    ];
    for (name, value) in positive {
        if !(value > 0.0) {
            return Err(format!("Config validation failed: {name} must be > 0"));
        }
    }

    let non_negative = [
        ("gravity", config.gravity),
        ("drag", config.drag),
        ("idle_snap_speed", config.idle_snap_speed),
        ("spawn_margin", config.spawn_margin),
        ("particle_velocity", config.particle_velocity),
    ];
    for (name, value) in non_negative {
        if !(value >= 0.0) {
            return Err(format!("Config validation failed: {name} must be >= 0"));
        }
    }

    if config.jump_velocity >= 0.0 {
        return Err("Config validation failed: jump_velocity must be < 0 (y points down)".to_string());
    }
    if config.max_jumps == 0 {
        return Err("Config validation failed: max_jumps must be > 0".to_string());
    }

    let durations = [
        ("dash_duration_ms", config.dash_duration_ms),
        ("lava_tick_ms", config.lava_tick_ms),
        ("fire_rate_normal_ms", config.fire_rate_normal_ms),
        ("fire_rate_fast_ms", config.fire_rate_fast_ms),
    ];
    for (name, value) in durations {
        if value == 0 {
            return Err(format!("Config validation failed: {name} must be > 0"));
        }
    }

    if config.max_health <= 0 {
        return Err("Config validation failed: max_health must be > 0".to_string());
    }
    if config.bullet_damage < 0 || config.chaser_damage < 0 || config.lava_damage < 0 {
        return Err("Config validation failed: damage values must be >= 0".to_string());
    }
    if config.bullet_pool_size == 0 {
        return Err("Config validation failed: bullet_pool_size must be > 0".to_string());
    }

    let sizes = [
        ("player_size", config.player_size),
        ("enemy_size", config.enemy_size),
        ("bullet_size", config.bullet_size),
        ("coin_size", config.coin_size),
        ("camera_deadzone", config.camera_deadzone),
    ];
    for (name, [w, h]) in sizes {
        if !(w > 0.0 && h > 0.0) {
            return Err(format!(
                "Config validation failed: {name} must have positive width and height"
            ));
        }
    }

    if !(config.camera_lerp > 0.0 && config.camera_lerp <= 1.0) {
        return Err("Config validation failed: camera_lerp must be in (0, 1]".to_string());
    }
    Ok(())
}

/// Polls a file's modification time so edits can be picked up at frame
/// boundaries without a filesystem notification backend.
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hs_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_match_level_tuning() {
        let config = GameConfig::default();
        assert_eq!(config.gravity, 1500.0);
        assert_eq!(config.jump_velocity, -700.0);
        assert_eq!(config.max_jumps, 2);
        assert_eq!(config.bullet_pool_size, 10);
        assert_eq!(config.shooter_count, 4);
        assert_eq!(config.chaser_count, 2);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "seed": 42, "max_health": 50 }"#).expect("write temp file");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_health, 50);
        assert_eq!(config.drag, 300.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let path = temp_file_path("pool");
        fs::write(&path, r#"{ "bullet_pool_size": 0 }"#).expect("write temp file");

        let err = load_config_from_path(&path).expect_err("zero pool should fail");
        assert!(err.contains("bullet_pool_size"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn upward_jump_velocity_is_required() {
        let config = GameConfig {
            jump_velocity: 700.0,
            ..GameConfig::default()
        };
        let err = validate_config(&config).expect_err("positive jump should fail");
        assert!(err.contains("jump_velocity"));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_file_path("missing");
        let err = load_config_from_path(&path).expect_err("missing file should fail");
        assert!(err.starts_with("Failed to read"));
    }

    #[test]
    fn watcher_reports_a_file_that_appears() {
        let path = temp_file_path("watch");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());
        fs::write(&path, "{}").expect("write temp file");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn shipped_tuning_matches_the_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/tuning.json");
        let config = load_config_from_path(&path).expect("shipped tuning should load");
        assert_eq!(config, GameConfig::default());
    }
}
