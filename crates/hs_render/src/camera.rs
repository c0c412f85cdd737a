//! 2D follow camera.
//!
//! World space is y-down (row 0 of a level is at the top), so the projection
//! flips the vertical axis. `position` is the world point at the centre of the
//! view.

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBounds {
    pub min: Vec2,
    pub max: Vec2,
}

pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
    /// Size of the box around the view centre inside which the target can move
    /// without the camera scrolling.
    pub deadzone: Vec2,
    pub bounds: Option<CameraBounds>,
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
            deadzone: Vec2::ZERO,
            bounds: None,
        }
    }

    /// Half extents of the visible world region.
    pub fn half_view(&self) -> Vec2 {
        Vec2::new(
            self.viewport.0 as f32 / (2.0 * self.zoom),
            self.viewport.1 as f32 / (2.0 * self.zoom),
        )
    }

    pub fn snap_to(&mut self, target: Vec2) {
        self.position = target;
        self.clamp_to_bounds();
    }

    /// Move toward `target`, scrolling only once it leaves the deadzone.
    /// `lerp` of 1.0 tracks exactly; smaller values ease in over several steps.
    pub fn follow(&mut self, target: Vec2, lerp: f32) {
        let half_dead = self.deadzone * 0.5;
        let mut desired = self.position;

        if target.x < self.position.x - half_dead.x {
            desired.x = target.x + half_dead.x;
        } else if target.x > self.position.x + half_dead.x {
            desired.x = target.x - half_dead.x;
        }
        if target.y < self.position.y - half_dead.y {
            desired.y = target.y + half_dead.y;
        } else if target.y > self.position.y + half_dead.y {
            desired.y = target.y - half_dead.y;
        }

        self.position += (desired - self.position) * lerp.clamp(0.0, 1.0);
        self.clamp_to_bounds();
    }

    pub fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let half = self.half_view();
        self.position.x = clamp_axis(self.position.x, bounds.min.x, bounds.max.x, half.x);
        self.position.y = clamp_axis(self.position.y, bounds.min.y, bounds.max.y, half.y);
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_view();

        // bottom > top flips y so that larger world y is lower on screen.
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y + half.y,
            self.position.y - half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

fn clamp_axis(value: f32, min: f32, max: f32, half_view: f32) -> f32 {
    if max - min <= half_view * 2.0 {
        // World narrower than the view: centre it.
        (min + max) * 0.5
    } else {
        value.clamp(min + half_view, max - half_view)
    }
}
