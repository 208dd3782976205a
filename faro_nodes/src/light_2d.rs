use faro_structs::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light2D {
    pub color: Color,
    pub intensity: f32,
    pub falloff: f32,
    /// Slot in the renderer's light table. Owned by the graph cache; lights
    /// are renumbered when an earlier light leaves the scene.
    pub light_index: u32,
}

impl Light2D {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            falloff: 1.0,
            light_index: 0,
        }
    }
}

impl Default for Light2D {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0)
    }
}
