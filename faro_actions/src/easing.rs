use faro_structs::Vector2;

/// Easing curve for action interpolation. The cubic variant runs the
/// Bernstein blend of the control points' output axis at parameter `t`
/// directly; `Linear` is its own variant because the blend form cannot
/// express the identity curve exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    CubicBezier { c1: Vector2, c2: Vector2 },
}

impl Easing {
    pub const fn cubic_bezier(c1: Vector2, c2: Vector2) -> Self {
        Self::CubicBezier { c1, c2 }
    }

    /// Cubic ease-in: reduces to `t³` under the blend.
    pub const fn ease_in() -> Self {
        Self::cubic_bezier(Vector2::new(0.32, 0.0), Vector2::new(0.67, 0.0))
    }

    /// Cubic ease-out: reduces to `1 - (1-t)³` under the blend.
    pub const fn ease_out() -> Self {
        Self::cubic_bezier(Vector2::new(0.33, 1.0), Vector2::new(0.67, 1.0))
    }

    pub const fn ease_in_out() -> Self {
        Self::cubic_bezier(Vector2::new(0.65, 0.0), Vector2::new(0.35, 1.0))
    }

    /// Eased progress for normalized time `t`, clamped to 0..1.
    /// Endpoints are exact for every curve: value(0) = 0, value(1) = 1.
    pub fn value(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicBezier { c1, c2 } => {
                let u = 1.0 - t;
                3.0 * u * u * t * c1.y + 3.0 * u * t * t * c2.y + t * t * t
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(Easing::Linear.value(t), t);
        }
    }

    #[test]
    fn endpoints_exact_for_all_presets() {
        for easing in [
            Easing::Linear,
            Easing::ease_in(),
            Easing::ease_out(),
            Easing::ease_in_out(),
        ] {
            assert_eq!(easing.value(0.0), 0.0);
            assert_eq!(easing.value(1.0), 1.0);
        }
    }

    #[test]
    fn value_clamps_out_of_range_time() {
        assert_eq!(Easing::ease_in().value(-3.0), 0.0);
        assert_eq!(Easing::ease_in().value(7.5), 1.0);
    }

    #[test]
    fn ease_in_starts_slow_ease_out_starts_fast() {
        assert!(Easing::ease_in().value(0.25) < 0.25);
        assert!(Easing::ease_out().value(0.25) > 0.25);
        // Symmetric curve crosses the diagonal at the midpoint.
        let mid = Easing::ease_in_out().value(0.5);
        assert!((mid - 0.5).abs() < 1e-5);
    }
}
