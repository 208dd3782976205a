use crate::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Lower-left corner (scene origin is bottom-left, y up)
    pub fn min(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Upper-right corner
    pub fn max(&self) -> Vector2 {
        Vector2::new(self.x + self.w, self.y + self.h)
    }

    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect(x:{}, y:{}, w:{}, h:{})",
            self.x, self.y, self.w, self.h
        )
    }
}
