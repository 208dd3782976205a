use crate::camera_2d::Camera2D;
use crate::light_2d::Light2D;
use crate::shape_2d::Shape2D;
use crate::sprite_2d::Sprite2D;
use crate::text_2d::Text2D;
use faro_ids::NodeID;
use faro_structs::{Size, Vector2, transform};
use glam::Mat4;
use std::borrow::Cow;

/// Closed set of node kinds. The graph cache switches on this to file nodes
/// into per-type draw buckets; adding a kind means adding a bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNodeData {
    Node,
    Shape2D(Shape2D),
    Sprite2D(Sprite2D),
    Text2D(Text2D),
    Light2D(Light2D),
    Camera2D(Camera2D),
}

/// Payload-free tag for [`SceneNodeData`], for dispatch that must not hold
/// a borrow of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Node,
    Shape2D,
    Sprite2D,
    Text2D,
    Light2D,
    Camera2D,
}

impl SceneNodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            SceneNodeData::Node => NodeKind::Node,
            SceneNodeData::Shape2D(_) => NodeKind::Shape2D,
            SceneNodeData::Sprite2D(_) => NodeKind::Sprite2D,
            SceneNodeData::Text2D(_) => NodeKind::Text2D,
            SceneNodeData::Light2D(_) => NodeKind::Light2D,
            SceneNodeData::Camera2D(_) => NodeKind::Camera2D,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind() {
            NodeKind::Node => "Node",
            NodeKind::Shape2D => "Shape2D",
            NodeKind::Sprite2D => "Sprite2D",
            NodeKind::Text2D => "Text2D",
            NodeKind::Light2D => "Light2D",
            NodeKind::Camera2D => "Camera2D",
        }
    }
}

/// One element of the scene tree: identity, spatial state, hierarchy links,
/// cached transforms, and the kind payload.
///
/// Back-references (`parent`, `camera`) are arena handles, never owning;
/// scene membership is the `in_scene` flag, set and cleared by the Scene
/// while it walks subtrees for cache bookkeeping.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeID,
    pub name: Cow<'static, str>,

    pub parent: NodeID,
    pub children: Vec<NodeID>,

    pub position: Vector2,
    /// Fraction of `size`, 0..1 per axis; (0.5, 0.5) = center.
    pub anchor: Vector2,
    pub z_position: i32,
    /// Degrees, positive turns clockwise on screen.
    pub rotation: f32,
    pub scale: Vector2,
    pub size: Size,

    pub visible: bool,
    /// Camera-space node: rendered at a fixed screen position regardless of
    /// camera pan/zoom (the camera's inverse view is folded into its world
    /// transform).
    pub is_ui: bool,
    pub in_scene: bool,
    /// Nearest ancestor camera, propagated at attach. Nil in orphan subtrees.
    pub camera: NodeID,

    pub data: SceneNodeData,

    // Transform cache. Valid only while `transform_dirty` is false; setting
    // any spatial property dirties this node and its whole subtree.
    pub local_transform: Mat4,
    pub world_transform: Mat4,
    pub transform_dirty: bool,
}

impl SceneNode {
    pub fn new(data: SceneNodeData) -> Self {
        let name = Cow::Borrowed(data.kind_name());
        Self {
            id: NodeID::nil(),
            name,
            parent: NodeID::nil(),
            children: Vec::new(),
            position: Vector2::zero(),
            anchor: Vector2::default_anchor(),
            z_position: 0,
            rotation: 0.0,
            scale: Vector2::one(),
            size: Size::zero(),
            visible: true,
            is_ui: false,
            in_scene: false,
            camera: NodeID::nil(),
            data,
            local_transform: Mat4::IDENTITY,
            world_transform: Mat4::IDENTITY,
            transform_dirty: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: Vector2) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Whether the graph cache files this node into a draw bucket.
    pub fn is_render_relevant(&self) -> bool {
        matches!(
            self.data,
            SceneNodeData::Shape2D(_)
                | SceneNodeData::Sprite2D(_)
                | SceneNodeData::Text2D(_)
                | SceneNodeData::Light2D(_)
        )
    }

    pub fn is_camera(&self) -> bool {
        matches!(self.data, SceneNodeData::Camera2D(_))
    }

    pub fn as_camera(&self) -> Option<&Camera2D> {
        match &self.data {
            SceneNodeData::Camera2D(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn as_camera_mut(&mut self) -> Option<&mut Camera2D> {
        match &mut self.data {
            SceneNodeData::Camera2D(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite2D> {
        match &self.data {
            SceneNodeData::Sprite2D(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite2D> {
        match &mut self.data {
            SceneNodeData::Sprite2D(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light2D> {
        match &self.data {
            SceneNodeData::Light2D(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light2D> {
        match &mut self.data {
            SceneNodeData::Light2D(light) => Some(light),
            _ => None,
        }
    }

    /// Local transform from the spatial properties. A camera's own transform
    /// is fixed to identity; it acts on the scene through its view matrix
    /// instead.
    pub fn local_matrix(&self) -> Mat4 {
        if self.is_camera() {
            return Mat4::IDENTITY;
        }
        transform::local_matrix(
            self.position,
            self.rotation,
            self.scale,
            self.anchor,
            self.size,
            self.z_position,
        )
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.transform_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faro_ids::TextureID;
    use faro_structs::Color;

    #[test]
    fn new_node_defaults() {
        let node = SceneNode::new(SceneNodeData::Node);
        assert_eq!(node.anchor, Vector2::new(0.5, 0.5));
        assert_eq!(node.scale, Vector2::one());
        assert!(node.visible);
        assert!(!node.is_ui);
        assert!(node.parent.is_nil());
        assert!(node.camera.is_nil());
        assert!(node.transform_dirty);
        assert_eq!(node.name, "Node");
    }

    #[test]
    fn render_relevance_by_kind() {
        assert!(!SceneNode::new(SceneNodeData::Node).is_render_relevant());
        assert!(
            !SceneNode::new(SceneNodeData::Camera2D(Camera2D::default())).is_render_relevant()
        );
        assert!(
            SceneNode::new(SceneNodeData::Shape2D(Shape2D::new(Color::WHITE)))
                .is_render_relevant()
        );
        assert!(
            SceneNode::new(SceneNodeData::Sprite2D(Sprite2D::new(TextureID::nil())))
                .is_render_relevant()
        );
        assert!(SceneNode::new(SceneNodeData::Text2D(Text2D::new("hi"))).is_render_relevant());
        assert!(
            SceneNode::new(SceneNodeData::Light2D(Light2D::default())).is_render_relevant()
        );
    }

    #[test]
    fn camera_local_matrix_is_identity() {
        let mut node = SceneNode::new(SceneNodeData::Camera2D(Camera2D::default()));
        node.position = Vector2::new(100.0, 100.0);
        node.rotation = 45.0;
        assert_eq!(node.local_matrix(), Mat4::IDENTITY);
    }
}
