use faro_structs::{Size, Vector2, transform};
use glam::Mat4;

/// 2D camera payload. The camera node's own spatial transform contributes
/// identity to its descendants; panning and zooming act only through the
/// view / inverse-view matrices computed here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    /// Zoom factor (1.0 = normal, >1.0 zoom in, <1.0 zoom out)
    pub zoom: f32,
    pub viewport_size: Size,
    pub view: Mat4,
    pub inverse_view: Mat4,
    pub view_dirty: bool,
}

impl Camera2D {
    pub fn new(viewport_size: Size) -> Self {
        Self {
            zoom: 1.0,
            viewport_size,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            view_dirty: true,
        }
    }

    /// Recompute the cached view matrices if zoom or position changed since
    /// the last refresh. `position` is the camera node's own position.
    pub fn refresh(&mut self, position: Vector2) {
        if !self.view_dirty {
            return;
        }
        self.view = transform::view_matrix(position, self.zoom);
        self.inverse_view = transform::inverse_view_matrix(position, self.zoom);
        self.view_dirty = false;
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Size::zero())
    }
}
