pub mod overlay;

pub use overlay::{HudView, Overlay, OverlayActions, OverlayStats};
