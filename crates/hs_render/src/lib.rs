pub mod camera;
pub mod gpu_context;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{Camera2D, CameraBounds, CameraUniform};
pub use gpu_context::{Frame, GpuContext};
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::{QuadBatch, SpriteVertex};
