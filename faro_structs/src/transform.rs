//! Matrix builders for node-local and camera transforms.
//! Scene coordinates are y-up with the screen origin top-left; positive
//! rotation degrees turn clockwise on screen, so the angle is negated going
//! into the matrix.

use crate::{Size, Vector2};
use glam::{Mat4, Vec3};

/// Local transform of a node: scale and rotation about the anchor point,
/// anchor placed at `position` in the parent's coordinates, `z_position`
/// in the translation z lane for depth ordering.
///
/// Column-vector form: `S(sx, sy) * T(position) * R(-rot) * T(-pivot)` with
/// `pivot = (size.width * anchor.x, size.height * anchor.y)`.
pub fn local_matrix(
    position: Vector2,
    rotation_degrees: f32,
    scale: Vector2,
    anchor: Vector2,
    size: Size,
    z_position: i32,
) -> Mat4 {
    let pivot = Vec3::new(size.width * anchor.x, size.height * anchor.y, 0.0);
    let translate = Vec3::new(position.x, position.y, z_position as f32);

    Mat4::from_scale(Vec3::new(scale.x, scale.y, 1.0))
        * Mat4::from_translation(translate)
        * Mat4::from_rotation_z(-rotation_degrees.to_radians())
        * Mat4::from_translation(-pivot)
}

/// Camera view transform: world position of the camera maps to the view
/// origin, zoom scales the result.
pub fn view_matrix(camera_position: Vector2, zoom: f32) -> Mat4 {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    Mat4::from_scale(Vec3::new(zoom, zoom, 1.0))
        * Mat4::from_translation(Vec3::new(-camera_position.x, -camera_position.y, 0.0))
}

/// Exact inverse of [`view_matrix`].
pub fn inverse_view_matrix(camera_position: Vector2, zoom: f32) -> Mat4 {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    Mat4::from_translation(Vec3::new(camera_position.x, camera_position.y, 0.0))
        * Mat4::from_scale(Vec3::new(1.0 / zoom, 1.0 / zoom, 1.0))
}
