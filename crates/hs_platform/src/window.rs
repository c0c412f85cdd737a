use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Window and presentation settings. `HEARTSHOT_NO_VSYNC=1` turns vsync off.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub resizable: bool,
    pub vsync: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Heartshot".to_string(),
            width: 1280,
            height: 720,
            min_width: 640,
            min_height: 360,
            resizable: true,
            vsync: true,
        }
    }
}

impl PlatformConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("HEARTSHOT_NO_VSYNC") {
            config.vsync = !flag_is_set(&value);
        }
        config
    }
}

fn flag_is_set(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_min_inner_size(LogicalSize::new(config.min_width, config.min_height))
        .with_resizable(config.resizable);

    let window = event_loop
        .create_window(attrs)
        .expect("Failed to create window");
    log::debug!(
        "Created window '{}' (vsync {})",
        config.title,
        if config.vsync { "on" } else { "off" }
    );
    Arc::new(window)
}
