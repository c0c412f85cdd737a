use hs_core::input::{InputState, Key};

use crate::game::SceneRequest;

pub const VICTORY_TITLE: &str = "Victory!";
pub const VICTORY_PROMPT: &str = "Press R to Restart";

/// Terminal screen shown once every enemy is down. A fresh R press starts
/// the level again.
#[derive(Debug, Default)]
pub struct VictoryScene;

impl VictoryScene {
    pub fn new() -> Self {
        log::info!("Victory!");
        Self
    }

    pub fn update(&mut self, input: &InputState) -> Option<SceneRequest> {
        input
            .is_just_pressed(Key::R)
            .then_some(SceneRequest::StartLevel)
    }
}
