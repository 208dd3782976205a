use faro_ids::TextureID;
use faro_structs::Color;

/// Textured quad, batched with every other sprite sharing its texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite2D {
    /// Texture identity; nil = untextured sentinel bucket.
    pub texture: TextureID,
    /// Tint, multiplied over the texture in the shader.
    pub color: Color,
    /// Position of this sprite inside its batch buffer. Owned by the graph
    /// cache; always equals the sprite's index in its bucket's node list.
    pub buffer_index: usize,
    /// The texture key this sprite is currently filed under in the cache.
    /// Diverges from `texture` between a texture swap and the cache refile.
    pub bucket_key: TextureID,
}

impl Sprite2D {
    pub fn new(texture: TextureID) -> Self {
        Self {
            texture,
            color: Color::WHITE,
            buffer_index: 0,
            bucket_key: TextureID::nil(),
        }
    }
}

impl Default for Sprite2D {
    fn default() -> Self {
        Self::new(TextureID::nil())
    }
}
