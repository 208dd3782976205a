use faro_scene::SPRITE_BUCKET_CAPACITY;
use serde::Deserialize;

/// Constructed once at startup and handed to [`crate::View::new`]; nothing
/// here is read from ambient global state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f32,
    pub height: f32,
    /// Depth of the in-flight frame ring (buffered frames the CPU may run
    /// ahead of the GPU).
    pub in_flight_frames: usize,
    /// Instance headroom per sprite batch buffer.
    pub sprite_bucket_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            in_flight_frames: 2,
            sprite_bucket_capacity: SPRITE_BUCKET_CAPACITY,
        }
    }
}

impl ViewConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_keys() {
        let config = ViewConfig::from_toml_str("width = 800.0\nheight = 600.0\n").unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.in_flight_frames, 2);
        assert_eq!(config.sprite_bucket_capacity, SPRITE_BUCKET_CAPACITY);
    }

    #[test]
    fn full_config_parses() {
        let config = ViewConfig::from_toml_str(
            "width = 1024.0\nheight = 768.0\nin_flight_frames = 3\nsprite_bucket_capacity = 64\n",
        )
        .unwrap();
        assert_eq!(config.in_flight_frames, 3);
        assert_eq!(config.sprite_bucket_capacity, 64);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(ViewConfig::from_toml_str("width = \"wide\"").is_err());
    }
}
