//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Movement and the restart key read this.
//!
//! - **Edge-triggered (just_pressed):** true only during the frame the key went
//!   down. Jump, fire and dash read `is_just_pressed`. It is cleared by
//!   `end_frame()`, which the main loop calls after each fixed simulation step.
//!   A press that lands on a frame with zero simulation steps is therefore never
//!   lost, and one press is never seen by two steps.
//!
//! Several physical keys may map to one `Key` (both Shift keys). A `Key` stays
//! held until every physical key behind it is up.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Space,
    Shift,
    R,
    D,
    Escape,
    F3,
}

pub struct InputState {
    /// Physical keys currently down per game key.
    held: HashMap<Key, u8>,
    just_pressed: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashMap::new(),
            just_pressed: HashSet::new(),
        }
    }

    /// Callers filter OS auto-repeat; every call is one more physical key down.
    pub fn key_down(&mut self, key: Key) {
        let count = self.held.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        if *count == 1 {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        let Some(count) = self.held.get_mut(&key) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains_key(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Release every held key. Used when the window loses focus so a key whose
    /// release event went elsewhere does not stay stuck down.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Shift);
        assert!(input.is_held(Key::Shift));
        assert!(input.is_just_pressed(Key::Shift));
    }

    #[test]
    fn test_key_up_clears_held() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_up(Key::Left);
        assert!(!input.is_held(Key::Left));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Space);
        assert!(!input.is_held(Key::Space));
        input.key_down(Key::Space);
        assert!(input.is_just_pressed(Key::Space));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Space);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Right));
        assert!(!input.is_just_pressed(Key::Space));
        // Held state persists across frames.
        assert!(input.is_held(Key::Right));
        assert!(input.is_held(Key::Space));
    }

    #[test]
    fn test_shift_stays_held_until_both_shift_keys_are_up() {
        let mut input = InputState::new();
        input.key_down(Key::Shift);
        input.end_frame();
        input.key_down(Key::Shift);
        // The second physical key is not a fresh press.
        assert!(!input.is_just_pressed(Key::Shift));

        input.key_up(Key::Shift);
        assert!(input.is_held(Key::Shift));
        input.key_up(Key::Shift);
        assert!(!input.is_held(Key::Shift));

        input.key_down(Key::Shift);
        assert!(input.is_just_pressed(Key::Shift));
    }

    #[test]
    fn test_release_all_clears_every_held_key() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::R);
        input.release_all();
        input.end_frame();
        assert!(!input.is_held(Key::Left));
        assert!(!input.is_held(Key::R));
        input.key_up(Key::Left);
        input.key_down(Key::Left);
        assert!(input.is_just_pressed(Key::Left));
    }

    #[test]
    fn test_multiple_keys_independent() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::Shift);
        input.key_up(Key::Left);
        assert!(!input.is_held(Key::Left));
        assert!(input.is_held(Key::Shift));
    }

    #[test]
    fn test_default_state_is_empty() {
        let input = InputState::default();
        assert!(!input.is_held(Key::Up));
        assert!(!input.is_just_pressed(Key::Up));
    }
}
