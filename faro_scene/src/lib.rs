pub mod error;
pub mod graph_cache;
pub mod scene;

pub use error::SceneError;
pub use graph_cache::{GraphCache, SPRITE_BUCKET_CAPACITY, SpriteBucket};
pub use scene::Scene;
