//! Heartshot: main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All simulation
//! runs inside `RedrawRequested` using a **fixed-timestep** model (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- one `Game::step` per fixed slice, then clear input edges
//!   3. Rebuild the quad mesh from the active scene
//!   4. Upload camera uniform, issue the draw call, composite the egui HUD and overlay
//!
//! Hot reload: the tuning file is watched via mtime polling and re-read at frame
//! boundaries. New values apply from the next level start.

mod body;
mod combat;
mod config;
mod draw;
mod enemy;
mod game;
mod particles;
mod platformer;
mod player;
#[cfg(test)]
mod replay;
mod tilemap;
mod victory;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{load_config_from_path, FileWatcher, GameConfig};
use game::{ActiveScene, Game, SceneRequest};
use hs_core::input::{InputState, Key};
use hs_core::time::{TimeState, FIXED_DT_US};
use hs_overlay::{HudView, Overlay, OverlayStats};
use hs_platform::window::PlatformConfig;
use hs_render::{Camera2D, CameraBounds, GpuContext, QuadBatch, SpritePipeline, SpriteVertex, Texture};
use tilemap::load_level_from_path;

const CONFIG_PATH: &str = "assets/config/tuning.json";
const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.42,
    g: 0.62,
    b: 0.86,
    a: 1.0,
};

/// All mutable engine state lives here. Constructed lazily in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    camera_lerp: f32,
    sprite_pipeline: SpritePipeline,
    overlay: Overlay,

    game: Game,
    config_watcher: FileWatcher,
    last_generation: u64,

    // The quad mesh is rebuilt on the CPU each frame, then streamed into these
    // GPU buffers. Buffers grow (power-of-two) but never shrink.
    batch: QuadBatch,
    white_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, vsync: bool) -> Self {
        let gpu = GpuContext::new(window.clone(), vsync);
        let time = TimeState::new();
        let input = InputState::new();
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);

        let config_path = PathBuf::from(CONFIG_PATH);
        let config = load_initial_config(&config_path);
        let level_path = PathBuf::from(&config.level_path);
        let map = load_level_from_path(&level_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load level '{}': {}",
                level_path.display(),
                err
            );
        });
        log::info!(
            "Level loaded: {} ({}x{} tiles)",
            map.level_id,
            map.width,
            map.height
        );

        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        configure_camera(&mut camera, &config);
        camera.bounds = Some(CameraBounds {
            min: Vec2::ZERO,
            max: Vec2::new(map.width_in_pixels(), map.height_in_pixels()),
        });
        let camera_lerp = config.camera_lerp;

        let game = Game::new(config, map);
        if let Some(target) = game.camera_target() {
            camera.snap_to(target);
        }

        let white = Texture::white(&gpu.device, &gpu.queue);
        let white_bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &white);

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time,
            input,
            camera,
            camera_lerp,
            sprite_pipeline,
            overlay,
            game,
            config_watcher: FileWatcher::new(config_path),
            last_generation: 0,
            batch: QuadBatch::with_capacity(1024),
            white_bind_group,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        };
        state.rebuild_mesh();
        state
    }

    fn reload_config(&mut self, reason: &str) {
        match load_config_from_path(self.config_watcher.path()) {
            Ok(config) => {
                configure_camera(&mut self.camera, &config);
                self.camera_lerp = config.camera_lerp;
                self.game.set_config(config);
                log::info!("Tuning reloaded ({reason}); applies on next level start");
            }
            Err(err) => {
                log::error!("Tuning reload failed ({reason}): {err}");
            }
        }
    }

    fn step(&mut self) {
        self.game.step(&self.input, FIXED_DT_US);

        let Some(target) = self.game.camera_target() else {
            return;
        };
        if self.game.generation() != self.last_generation {
            self.last_generation = self.game.generation();
            self.camera.snap_to(target);
        } else {
            self.camera.follow(target, self.camera_lerp);
        }
    }

    fn rebuild_mesh(&mut self) {
        draw::build_mesh(&self.game, &mut self.batch);
        self.ensure_mesh_capacity(self.batch.vertices.len(), self.batch.indices.len());
        if !self.batch.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.batch.vertices),
            );
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.batch.indices),
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let mut stats = OverlayStats {
            scene_label: self.game.scene().label().to_string(),
            quad_count: self.batch.quad_count() as u32,
            ..OverlayStats::default()
        };
        if let Some(scene) = self.game.platformer() {
            let body = &scene.player().body;
            stats.player_state = scene.player().state().label().to_string();
            stats.player_velocity = (body.velocity.x, body.velocity.y);
            stats.active_shooters = scene.active_shooters() as u32;
            stats.active_chasers = scene.active_chasers() as u32;
            stats.player_bullets = scene.player_bullets().count_active() as u32;
            stats.enemy_bullets = scene.enemy_bullets().count_active() as u32;
            stats.particles = scene.particles().particle_count() as u32;
            stats.timers = scene.timer_count() as u32;
            stats.physics_debug = scene.physics_debug();
        }
        stats
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::from_env(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = hs_platform::window::create_window(event_loop, &self.config);
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(window, self.config.vsync));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    state.camera.clamp_to_bounds();
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if event.repeat {
                    return;
                }
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();

                // Tuning reload at frame boundary (safe point)
                if state.config_watcher.should_reload() {
                    state.reload_config("file watcher");
                }

                while state.time.should_step() {
                    if state.input.is_just_pressed(Key::Escape) {
                        event_loop.exit();
                        return;
                    }
                    if state.input.is_just_pressed(Key::F3) {
                        state.overlay.toggle_debug();
                    }
                    state.step();
                    // Edges are consumed by exactly one step.
                    state.input.end_frame();
                }
                state.time.end_frame();

                state.rebuild_mesh();

                // Render phase reads finalized simulation state from this frame.
                let camera_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[camera_uniform]),
                );

                let Some(frame) = state.gpu.begin_frame() else {
                    return;
                };

                let stats = state.overlay_stats();
                let hud = match state.game.scene() {
                    ActiveScene::Platformer(scene) => HudView::Level {
                        health_text: scene.health_text(),
                    },
                    ActiveScene::Victory(_) => HudView::Victory {
                        title: victory::VICTORY_TITLE,
                        prompt: victory::VICTORY_PROMPT,
                    },
                };
                let (egui_primitives, egui_textures_delta, overlay_actions) =
                    state
                        .overlay
                        .prepare(&state.window, &state.time, hud, Some(stats));

                // Handle overlay button actions
                if overlay_actions.toggle_physics_debug {
                    if let ActiveScene::Platformer(scene) = state.game.scene_mut() {
                        scene.toggle_physics_debug();
                    }
                }
                if overlay_actions.restart {
                    state.game.apply(SceneRequest::Restart);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &frame.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(SKY_COLOR),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    let index_count = state.batch.indices.len() as u32;
                    if index_count > 0 {
                        render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                        render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                        render_pass.set_bind_group(1, &state.white_bind_group, &[]);
                        render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            state.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..index_count, 0, 0..1);
                    }
                }

                state.overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &frame.view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                frame.present();
            }

            _ => {}
        }
    }
}

fn load_initial_config(path: &Path) -> GameConfig {
    if !path.exists() {
        log::warn!(
            "Tuning file '{}' not found, using built-in defaults.",
            path.display()
        );
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}. Using built-in defaults.");
            GameConfig::default()
        }
    }
}

fn configure_camera(camera: &mut Camera2D, config: &GameConfig) {
    camera.zoom = config.camera_zoom;
    camera.deadzone = Vec2::from(config.camera_deadzone);
    camera.clamp_to_bounds();
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Heartshot starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_shift_and_letter_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::ArrowUp), Some(Key::Up));
        assert_eq!(map_key(KeyCode::ShiftRight), Some(Key::Shift));
        assert_eq!(map_key(KeyCode::ShiftLeft), Some(Key::Shift));
        assert_eq!(map_key(KeyCode::KeyD), Some(Key::D));
        assert_eq!(map_key(KeyCode::KeyW), None);
    }

    #[test]
    fn missing_tuning_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "hs_missing_tuning_{}.json",
            std::process::id()
        ));
        assert_eq!(load_initial_config(&path), GameConfig::default());
    }
}
