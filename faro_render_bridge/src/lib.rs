//! Boundary types between the scene core and its external collaborators:
//! the GPU buffer manager (owns batched vertex buffers, accepts raw byte
//! writes) and the frame renderer (consumes per-type draw buckets plus the
//! camera view matrix). Neither side is implemented here.

use bytemuck::{Pod, Zeroable};
use faro_ids::{BufferID, NodeID, TextureID};

/// Per-sprite quad geometry as it lives in a batched GPU buffer.
/// Written on add and on geometry change (size/color/texture region), never
/// on movement — world transforms travel in the per-frame draw list instead.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Zeroable, Pod)]
pub struct SpriteInstance {
    pub size: [f32; 2],
    pub anchor: [f32; 2],
    pub color: [f32; 4],
    pub z_position: f32,
    pub _pad: [f32; 3],
}

pub const SPRITE_INSTANCE_STRIDE: usize = core::mem::size_of::<SpriteInstance>();

/// Owns GPU vertex buffers. `write` addresses instances, not bytes: the
/// byte offset is `instance_index * SPRITE_INSTANCE_STRIDE`.
pub trait BufferManager {
    fn allocate(&mut self, byte_len: usize) -> BufferID;
    fn write(&mut self, buffer: BufferID, bytes: &[u8], instance_index: usize);
    fn release(&mut self, buffer: BufferID);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2DState {
    pub position: [f32; 2],
    pub zoom: f32,
    pub viewport: [f32; 2],
}

impl Default for Camera2DState {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            zoom: 1.0,
            viewport: [0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShapeDraw {
    pub node: NodeID,
    pub world: [[f32; 4]; 4],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub z_position: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct SpriteDraw {
    pub node: NodeID,
    pub buffer_index: usize,
    pub world: [[f32; 4]; 4],
}

/// One instanced draw call: every sprite sharing a texture key.
#[derive(Debug, Clone)]
pub struct SpriteBatch {
    pub texture: TextureID,
    pub buffer: BufferID,
    pub sprites: Vec<SpriteDraw>,
}

#[derive(Debug, Clone)]
pub struct TextDraw {
    pub node: NodeID,
    pub world: [[f32; 4]; 4],
    pub content: String,
    pub font_size: f32,
    pub color: [f32; 4],
    pub z_position: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct LightDraw {
    pub node: NodeID,
    pub light_index: u32,
    pub world_position: [f32; 2],
    pub color: [f32; 4],
    pub intensity: f32,
    pub falloff: f32,
}

/// Everything the renderer needs for one frame, in cache order.
#[derive(Debug, Clone, Default)]
pub struct FrameDrawList {
    pub view: [[f32; 4]; 4],
    pub camera: Camera2DState,
    pub ambient_light: [f32; 4],
    pub shapes: Vec<ShapeDraw>,
    pub sprite_batches: Vec<SpriteBatch>,
    pub texts: Vec<TextDraw>,
    pub lights: Vec<LightDraw>,
}

/// The external renderer. Responsible for all GPU submission; must call the
/// frame ring's signal once the frame's buffer slot is free again.
pub trait FrameRenderer {
    fn draw_frame(&mut self, frame: &FrameDrawList);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_instance_stride_is_pod_size() {
        assert_eq!(SPRITE_INSTANCE_STRIDE, 48);
        let instance = SpriteInstance {
            size: [64.0, 64.0],
            anchor: [0.5, 0.5],
            color: [1.0, 1.0, 1.0, 1.0],
            z_position: 3.0,
            _pad: [0.0; 3],
        };
        let bytes = bytemuck::bytes_of(&instance);
        assert_eq!(bytes.len(), SPRITE_INSTANCE_STRIDE);
        let back: &SpriteInstance = bytemuck::from_bytes(bytes);
        assert_eq!(*back, instance);
    }
}
