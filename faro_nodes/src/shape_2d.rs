use faro_structs::Color;

/// Solid-color quad. Geometry comes from the owning node's size/anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape2D {
    pub color: Color,
}

impl Shape2D {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for Shape2D {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
        }
    }
}
