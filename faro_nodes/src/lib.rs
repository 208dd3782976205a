pub mod camera_2d;
pub mod light_2d;
pub mod node_arena;
pub mod scene_node;
pub mod shape_2d;
pub mod sprite_2d;
pub mod text_2d;

pub use camera_2d::Camera2D;
pub use light_2d::Light2D;
pub use node_arena::NodeArena;
pub use scene_node::{NodeKind, SceneNode, SceneNodeData};
pub use shape_2d::Shape2D;
pub use sprite_2d::Sprite2D;
pub use text_2d::Text2D;
