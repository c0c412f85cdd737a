//! Screen-space UI rendered via egui on top of the game scene: the gameplay
//! HUD, the victory screen text, and the F3 debug window.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The HUD is drawn every frame. The debug window only runs when `debug_visible`
//! is set (toggled by F3).

use egui::{Align2, Color32, RichText};
use hs_core::time::TimeState;
use winit::window::Window;

/// What the HUD should show for the active scene.
#[derive(Debug, Clone, Copy)]
pub enum HudView<'a> {
    Level { health_text: &'a str },
    Victory { title: &'a str, prompt: &'a str },
}

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub scene_label: String,
    pub player_state: String,
    pub player_velocity: (f32, f32),
    pub active_shooters: u32,
    pub active_chasers: u32,
    pub player_bullets: u32,
    pub enemy_bullets: u32,
    pub particles: u32,
    pub timers: u32,
    pub quad_count: u32,
    pub physics_debug: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// User clicked the physics debug toggle
    pub toggle_physics_debug: bool,
    /// User clicked the restart button
    pub restart: bool,
}

pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl Overlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug window: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        hud: HudView<'_>,
        stats: Option<OverlayStats>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_hud(ctx, hud);

            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 60.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                        ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                        ui.label(format!("Total steps: {}", time.fixed_step_count));
                        let Some(stats) = stats.as_ref() else {
                            return;
                        };
                        ui.separator();
                        ui.label(format!("Scene: {}", stats.scene_label));
                        ui.label(format!("Player: {}", stats.player_state));
                        ui.label(format!(
                            "Velocity: ({:.0}, {:.0})",
                            stats.player_velocity.0, stats.player_velocity.1
                        ));
                        ui.label(format!(
                            "Enemies: {} shooters, {} chasers",
                            stats.active_shooters, stats.active_chasers
                        ));
                        ui.label(format!(
                            "Bullets: {} player, {} enemy",
                            stats.player_bullets, stats.enemy_bullets
                        ));
                        ui.label(format!("Particles: {}", stats.particles));
                        ui.label(format!("Timers: {}", stats.timers));
                        ui.label(format!("Quads: {}", stats.quad_count));

                        ui.separator();
                        ui.horizontal(|ui| {
                            let label = if stats.physics_debug {
                                "Hide bodies"
                            } else {
                                "Show bodies"
                            };
                            if ui.button(label).clicked() {
                                actions.toggle_physics_debug = true;
                            }
                            if ui.button("Restart").clicked() {
                                actions.restart = true;
                            }
                        });
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn draw_hud(ctx: &egui::Context, hud: HudView<'_>) {
    match hud {
        HudView::Level { health_text } => {
            egui::Area::new(egui::Id::new("hud_health"))
                .anchor(Align2::CENTER_TOP, [0.0, 12.0])
                .interactable(false)
                .show(ctx, |ui| {
                    ui.label(
                        RichText::new(health_text)
                            .size(20.0)
                            .color(Color32::WHITE)
                            .strong(),
                    );
                });
        }
        HudView::Victory { title, prompt } => {
            egui::Area::new(egui::Id::new("victory_text"))
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .interactable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new(title).size(48.0).color(Color32::WHITE));
                        ui.add_space(24.0);
                        ui.label(RichText::new(prompt).size(24.0).color(Color32::WHITE));
                    });
                });
        }
    }
}
