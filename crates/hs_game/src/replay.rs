//! Scripted key sequences for driving a `Game` without a window.
//!
//! A replay lists held-key frames; each frame is held for `repeat` fixed
//! steps. Key presses and releases are derived from the differences between
//! consecutive frames, so a jump needs a frame with `up` followed by one
//! without it before it can fire again.

use hs_core::input::{InputState, Key};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::game::{Game, SceneRequest};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt_us")]
    pub fixed_dt_us: u64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReplayFrame {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub fire: bool,
    pub dash: bool,
    pub restart: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplayFrame {
    fn held_keys(&self) -> Vec<Key> {
        [
            (self.left, Key::Left),
            (self.right, Key::Right),
            (self.up, Key::Up),
            (self.fire, Key::Space),
            (self.dash, Key::Shift),
            (self.restart, Key::R),
        ]
        .into_iter()
        .filter_map(|(held, key)| held.then_some(key))
        .collect()
    }
}

impl ReplaySequence {
    /// One held-key set per fixed step.
    pub fn expanded_keys(&self) -> Vec<Vec<Key>> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let keys = frame.held_keys();
            for _ in 0..frame.repeat.max(1) {
                out.push(keys.clone());
            }
        }
        out
    }

    /// Plays the whole sequence into `game` and returns every scene request
    /// it produced, in order.
    pub fn run(&self, game: &mut Game) -> Vec<SceneRequest> {
        let mut input = InputState::new();
        let mut previous: Vec<Key> = Vec::new();
        let mut requests = Vec::new();
        for keys in self.expanded_keys() {
            for key in previous.iter().filter(|k| !keys.contains(k)) {
                input.key_up(*key);
            }
            for key in keys.iter().filter(|k| !previous.contains(k)) {
                input.key_down(*key);
            }
            if let Some(request) = game.step(&input, self.fixed_dt_us) {
                requests.push(request);
            }
            input.end_frame();
            previous = keys;
        }
        requests
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt_us == 0 {
        return Err("Replay validation failed: fixed_dt_us must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt_us() -> u64 {
    hs_core::time::FIXED_DT_US
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::tilemap::tests::test_level;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hs_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn seeded_game(seed: u64) -> Game {
        let config = GameConfig {
            seed: Some(seed),
            ..GameConfig::default()
        };
        Game::new(config, test_level())
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "right": true, "repeat": 3 },
                { "right": true, "up": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.fixed_dt_us, hs_core::time::FIXED_DT_US);
        let expanded = replay.expanded_keys();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0], vec![Key::Right]);
        assert_eq!(expanded[3], vec![Key::Right, Key::Up]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay must fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn restart_frame_produces_a_restart_request() {
        let replay = ReplaySequence {
            fixed_dt_us: hs_core::time::FIXED_DT_US,
            frames: vec![
                ReplayFrame {
                    repeat: 5,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    restart: true,
                    repeat: 1,
                    ..ReplayFrame::default()
                },
            ],
        };
        let mut game = seeded_game(4);
        assert_eq!(replay.run(&mut game), vec![SceneRequest::Restart]);
        assert_eq!(game.restarts(), 1);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "right": true, "repeat": 40 },
                { "right": true, "up": true },
                { "right": true, "repeat": 10 },
                { "right": true, "up": true },
                { "right": true, "fire": true },
                { "right": true, "repeat": 20 },
                { "dash": true },
                { "repeat": 30 },
                { "left": true, "fire": true },
                { "left": true, "repeat": 45 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let mut run_a = seeded_game(11);
        let mut run_b = seeded_game(11);
        let requests_a = replay.run(&mut run_a);
        let requests_b = replay.run(&mut run_b);

        assert_eq!(requests_a, requests_b);
        assert_eq!(run_a.generation(), run_b.generation());
        assert_eq!(run_a.scene().label(), run_b.scene().label());
        if let (Some(a), Some(b)) = (run_a.platformer(), run_b.platformer()) {
            let (pa, pb) = (&a.player().body, &b.player().body);
            assert!((pa.position - pb.position).length() < 0.0001);
            assert!((pa.velocity - pb.velocity).length() < 0.0001);
            assert_eq!(a.player().health, b.player().health);
            assert_eq!(a.active_shooters(), b.active_shooters());
            assert_eq!(a.active_chasers(), b.active_chasers());
            assert_eq!(
                a.enemy_bullets().count_active(),
                b.enemy_bullets().count_active()
            );
            assert_eq!(a.particles().particle_count(), b.particles().particle_count());
        }

        let _ = fs::remove_file(path);
    }
}
