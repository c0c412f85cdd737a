//! Scene manager.
//!
//! `Game` owns the active scene and applies scene requests at step
//! boundaries. The level layout is loaded once and shared by every level
//! start; each start rolls a fresh seed from the game RNG so restarts are
//! different but a seeded run replays identically.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use hs_core::input::InputState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::platformer::PlatformerScene;
use crate::player::PlayerIntent;
use crate::tilemap::Tilemap;
use crate::victory::VictoryScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    /// Rebuild the level from scratch (death or the restart key).
    Restart,
    Victory,
    /// Leave the victory screen for a new level.
    StartLevel,
}

pub enum ActiveScene {
    Platformer(Box<PlatformerScene>),
    Victory(VictoryScene),
}

impl ActiveScene {
    pub fn label(&self) -> &'static str {
        match self {
            ActiveScene::Platformer(_) => "Platformer",
            ActiveScene::Victory(_) => "Victory",
        }
    }
}

pub struct Game {
    config: GameConfig,
    map: Rc<Tilemap>,
    rng: StdRng,
    scene: ActiveScene,
    generation: u64,
    restarts: u32,
}

impl Game {
    pub fn new(config: GameConfig, map: Tilemap) -> Self {
        let seed = config.seed.unwrap_or_else(clock_seed);
        log::info!("Game seed: {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let map = Rc::new(map);
        let scene = ActiveScene::Platformer(Box::new(PlatformerScene::new(
            &config,
            Rc::clone(&map),
            rng.gen(),
        )));
        Self {
            config,
            map,
            rng,
            scene,
            generation: 0,
            restarts: 0,
        }
    }

    /// Runs one fixed step of the active scene and applies whatever it
    /// requested. The applied request is returned for the caller's bookkeeping.
    pub fn step(&mut self, input: &InputState, dt_us: u64) -> Option<SceneRequest> {
        let request = match &mut self.scene {
            ActiveScene::Platformer(scene) => scene.update(&PlayerIntent::from_input(input), dt_us),
            ActiveScene::Victory(scene) => scene.update(input),
        };
        if let Some(request) = request {
            self.apply(request);
        }
        request
    }

    pub fn apply(&mut self, request: SceneRequest) {
        match request {
            SceneRequest::Restart => {
                self.restarts += 1;
                log::info!("Restarting level (restart #{})", self.restarts);
                self.start_level();
            }
            SceneRequest::StartLevel => self.start_level(),
            SceneRequest::Victory => self.scene = ActiveScene::Victory(VictoryScene::new()),
        }
        self.generation += 1;
    }

    fn start_level(&mut self) {
        let seed = self.rng.gen();
        self.scene = ActiveScene::Platformer(Box::new(PlatformerScene::new(
            &self.config,
            Rc::clone(&self.map),
            seed,
        )));
    }

    /// Replaces the tuning. The running level keeps its values; the next
    /// level start uses the new ones.
    pub fn set_config(&mut self, config: GameConfig) {
        if config.level_path != self.config.level_path {
            log::warn!(
                "level_path changed to '{}'; the level is only loaded at startup",
                config.level_path
            );
        }
        self.config = config;
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scene(&self) -> &ActiveScene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut ActiveScene {
        &mut self.scene
    }

    pub fn platformer(&self) -> Option<&PlatformerScene> {
        match &self.scene {
            ActiveScene::Platformer(scene) => Some(&**scene),
            ActiveScene::Victory(_) => None,
        }
    }

    /// Bumped every time the active scene is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn camera_target(&self) -> Option<Vec2> {
        self.platformer().map(|scene| scene.player().body.position)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
