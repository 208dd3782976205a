pub mod color;
pub mod rect;
pub mod size;
pub mod transform;
pub mod vector2;

pub use color::Color;
pub use rect::Rect;
pub use size::Size;
pub use vector2::Vector2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_ops() {
        let a = Vector2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a + Vector2::one(), Vector2::new(4.0, 5.0));
        assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
        assert_eq!(Vector2::lerp(Vector2::zero(), a, 0.5), Vector2::new(1.5, 2.0));
    }

    #[test]
    fn rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Vector2::new(10.0, 10.0)));
        assert!(r.contains(Vector2::new(30.0, 30.0)));
        assert!(r.contains(Vector2::new(20.0, 15.0)));
        assert!(!r.contains(Vector2::new(9.9, 15.0)));
        assert!(!r.contains(Vector2::new(20.0, 30.1)));
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert_eq!(c, Color::new(255, 128, 0, 255));
        let c = Color::from_hex("11223344").unwrap();
        assert_eq!(c, Color::new(0x11, 0x22, 0x33, 0x44));
        assert!(Color::from_hex("12345").is_err());
    }

    #[test]
    fn color_to_f32_normalizes() {
        let c = Color::new(255, 0, 128, 255).to_f32_array();
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 128.0 / 255.0).abs() < f32::EPSILON);
        assert_eq!(c[3], 1.0);
    }
}
