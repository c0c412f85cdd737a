#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // tex_coords
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, color) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// CPU-side batch of axis-aligned coloured quads, uploaded once per frame.
#[derive(Debug, Default)]
pub struct QuadBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
}

impl QuadBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn push_rect(&mut self, center: [f32; 2], size: [f32; 2], color: [f32; 4]) {
        let half_w = size[0] * 0.5;
        let half_h = size[1] * 0.5;
        let [cx, cy] = center;
        let base_index = self.vertices.len() as u32;

        let corners = [
            ([cx - half_w, cy - half_h], [0.0, 0.0]),
            ([cx + half_w, cy - half_h], [1.0, 0.0]),
            ([cx + half_w, cy + half_h], [1.0, 1.0]),
            ([cx - half_w, cy + half_h], [0.0, 1.0]),
        ];
        for (position, tex_coords) in corners {
            self.vertices.push(SpriteVertex {
                position,
                tex_coords,
                color,
            });
        }

        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
    }

    /// Four thin quads tracing the edge of a rectangle.
    pub fn push_outline(&mut self, center: [f32; 2], size: [f32; 2], thickness: f32, color: [f32; 4]) {
        let [cx, cy] = center;
        let half_w = size[0] * 0.5;
        let half_h = size[1] * 0.5;
        self.push_rect([cx, cy - half_h], [size[0], thickness], color);
        self.push_rect([cx, cy + half_h], [size[0], thickness], color);
        self.push_rect([cx - half_w, cy], [thickness, size[1]], color);
        self.push_rect([cx + half_w, cy], [thickness, size[1]], color);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}
