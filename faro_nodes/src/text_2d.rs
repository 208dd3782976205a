use faro_structs::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct Text2D {
    pub content: String,
    pub font_size: f32,
    pub color: Color,
}

impl Text2D {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: 16.0,
            color: Color::WHITE,
        }
    }
}

impl Default for Text2D {
    fn default() -> Self {
        Self::new(String::new())
    }
}
