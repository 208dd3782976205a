//! The root object of a scene graph: owns the node arena, the root camera,
//! the graph cache, and the per-node action table. All tree mutation flows
//! through here so cache bookkeeping stays atomic with tree edits.

use crate::error::SceneError;
use crate::graph_cache::{GraphCache, SPRITE_BUCKET_CAPACITY};
use ahash::AHashMap;
use faro_actions::Action;
use faro_ids::NodeID;
use faro_nodes::{NodeArena, SceneNode};
use faro_render_bridge::{
    BufferManager, Camera2DState, FrameDrawList, LightDraw, ShapeDraw, SpriteBatch, SpriteDraw,
    TextDraw,
};
use faro_structs::{Color, Rect, Size, Vector2};
use glam::{Mat4, Vec3};
use log::warn;

pub struct Scene {
    nodes: NodeArena,
    camera: NodeID,
    cache: GraphCache,
    actions: AHashMap<NodeID, Action>,
    pub ambient_light_color: Color,
    view_size: Size,
    tick_scratch: Vec<NodeID>,
}

impl Scene {
    pub fn new(view_size: Size) -> Self {
        Self::with_bucket_capacity(view_size, SPRITE_BUCKET_CAPACITY)
    }

    pub fn with_bucket_capacity(view_size: Size, bucket_capacity: usize) -> Self {
        let mut nodes = NodeArena::new();
        let mut camera_node =
            SceneNode::new(faro_nodes::SceneNodeData::Camera2D(faro_nodes::Camera2D::new(
                view_size,
            )))
            .with_name("Camera");
        camera_node.in_scene = true;
        let camera = nodes.insert(camera_node);
        if let Some(node) = nodes.get_mut(camera) {
            node.camera = camera;
        }
        let mut cache = GraphCache::with_bucket_capacity(bucket_capacity);
        cache.track(camera);
        Self {
            nodes,
            camera,
            cache,
            actions: AHashMap::new(),
            ambient_light_color: Color::WHITE,
            view_size,
            tick_scratch: Vec::new(),
        }
    }

    pub fn camera(&self) -> NodeID {
        self.camera
    }

    pub fn view_size(&self) -> Size {
        self.view_size
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    pub fn node(&self, id: NodeID) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Direct mutable access. Prefer the setters: raw mutation bypasses
    /// dirty marking and sprite buffer refreshes.
    pub fn node_mut(&mut self, id: NodeID) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---------------- tree building ----------------

    /// Add a top-level node: every top-level node is camera-parented, so the
    /// whole scene pans and zooms together.
    pub fn add(&mut self, node: SceneNode, buffers: &mut dyn BufferManager) -> NodeID {
        let camera = self.camera;
        self.add_child(camera, node, buffers)
    }

    /// Add a camera-space node (HUD element): fixed on screen regardless of
    /// camera pan/zoom.
    pub fn add_ui(&mut self, mut node: SceneNode, buffers: &mut dyn BufferManager) -> NodeID {
        node.is_ui = true;
        self.add(node, buffers)
    }

    /// Insert a fresh node and attach it under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeID,
        node: SceneNode,
        buffers: &mut dyn BufferManager,
    ) -> NodeID {
        let id = self.nodes.insert(node);
        let _ = self.attach(parent, id, buffers);
        id
    }

    /// Attach an existing (detached) node under `parent`. Preconditions: the
    /// child has no parent and is not registered to the scene; violations
    /// log and no-op.
    pub fn attach(
        &mut self,
        parent: NodeID,
        child: NodeID,
        buffers: &mut dyn BufferManager,
    ) -> Result<(), SceneError> {
        if parent == child {
            let err = SceneError::AlreadyAttached { node: child };
            warn!("attach: node {child} cannot be its own parent");
            return Err(err);
        }
        let Some((child_parent, child_in_scene)) =
            self.nodes.get(child).map(|n| (n.parent, n.in_scene))
        else {
            let err = SceneError::NotFound { node: child };
            warn!("attach: {err}");
            return Err(err);
        };
        if !child_parent.is_nil() || child_in_scene {
            let err = SceneError::AlreadyAttached { node: child };
            warn!("attach: {err}");
            return Err(err);
        }
        let Some((parent_in_scene, parent_camera, parent_is_camera)) = self
            .nodes
            .get(parent)
            .map(|n| (n.in_scene, n.camera, n.is_camera()))
        else {
            let err = SceneError::NotFound { node: parent };
            warn!("attach: {err}");
            return Err(err);
        };

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            // Append = bottom of the same-z paint order among siblings.
            node.children.push(child);
        }

        let subtree = self.collect_subtree(child);
        if parent_in_scene {
            let inherited_camera = if parent_is_camera { parent } else { parent_camera };
            for &id in &subtree {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.in_scene = true;
                    if node.camera.is_nil() {
                        node.camera = inherited_camera;
                    }
                    node.mark_dirty();
                }
                self.cache.add(&mut self.nodes, id, buffers);
            }
        } else {
            for &id in &subtree {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.mark_dirty();
                }
            }
        }
        Ok(())
    }

    /// Detach `id` from its parent and evict it (with its whole subtree)
    /// from the cache. The subtree stays alive and connected below `id` —
    /// an orphan tree the caller may re-attach or `despawn`. Returns the
    /// removed node's id, or None if it was not attached.
    pub fn remove(&mut self, id: NodeID, buffers: &mut dyn BufferManager) -> Option<NodeID> {
        let Some((parent, in_scene)) = self.nodes.get(id).map(|n| (n.parent, n.in_scene)) else {
            warn!("remove: {}", SceneError::NotFound { node: id });
            return None;
        };
        if parent.is_nil() {
            warn!("remove: node {id} has no parent");
            return None;
        }

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = NodeID::nil();
        }

        let subtree = self.collect_subtree(id);
        if in_scene {
            for &nid in &subtree {
                if let Some(node) = self.nodes.get_mut(nid) {
                    node.in_scene = false;
                    node.camera = NodeID::nil();
                }
                self.cache.remove(&mut self.nodes, nid, buffers);
            }
        }
        for &nid in &subtree {
            if let Some(node) = self.nodes.get_mut(nid) {
                node.mark_dirty();
            }
        }
        Some(id)
    }

    /// Remove (if attached) and free the subtree from the arena, dropping
    /// any pending actions.
    pub fn despawn(&mut self, id: NodeID, buffers: &mut dyn BufferManager) {
        if self.nodes.get(id).is_some_and(|n| !n.parent.is_nil()) {
            self.remove(id, buffers);
        } else if self.nodes.get(id).is_some_and(|n| n.in_scene) {
            // Detached but still registered should not happen; evict anyway.
            let subtree = self.collect_subtree(id);
            for &nid in &subtree {
                self.cache.remove(&mut self.nodes, nid, buffers);
            }
        }
        for nid in self.collect_subtree(id) {
            self.actions.remove(&nid);
            self.nodes.remove(nid);
        }
    }

    /// First direct child of `parent` with the given name.
    pub fn child_named(&self, parent: NodeID, name: &str) -> Option<NodeID> {
        let parent = self.nodes.get(parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(|n| n.name == name))
    }

    /// Subtree ids in paint order (parent before children, siblings in
    /// insertion order).
    fn collect_subtree(&self, id: NodeID) -> Vec<NodeID> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(nid) = stack.pop() {
            let Some(node) = self.nodes.get(nid) else {
                continue;
            };
            out.push(nid);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // ---------------- spatial setters ----------------

    pub fn set_position(&mut self, id: NodeID, position: Vector2) {
        let mut is_camera = false;
        if let Some(node) = self.nodes.get_mut(id) {
            node.position = position;
            if let Some(camera) = node.as_camera_mut() {
                camera.view_dirty = true;
                is_camera = true;
            }
        } else {
            warn!("set_position: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
        if is_camera {
            self.mark_ui_dirty();
        }
    }

    pub fn set_rotation(&mut self, id: NodeID, degrees: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rotation = degrees;
        } else {
            warn!("set_rotation: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
    }

    pub fn set_scale(&mut self, id: NodeID, scale: Vector2) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.scale = scale;
        } else {
            warn!("set_scale: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
    }

    pub fn set_z_position(&mut self, id: NodeID, z: i32, buffers: &mut dyn BufferManager) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.z_position = z;
        } else {
            warn!("set_z_position: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
        self.refresh_sprite_geometry(id, buffers);
    }

    pub fn set_anchor(&mut self, id: NodeID, anchor: Vector2, buffers: &mut dyn BufferManager) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.anchor = anchor;
        } else {
            warn!("set_anchor: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
        self.refresh_sprite_geometry(id, buffers);
    }

    pub fn set_size(&mut self, id: NodeID, size: Size, buffers: &mut dyn BufferManager) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.size = size;
        } else {
            warn!("set_size: {}", SceneError::NotFound { node: id });
            return;
        }
        self.mark_dirty_subtree(id);
        self.refresh_sprite_geometry(id, buffers);
    }

    pub fn set_visible(&mut self, id: NodeID, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        } else {
            warn!("set_visible: {}", SceneError::NotFound { node: id });
        }
    }

    /// Swap a sprite's texture: the sprite is refiled under the new batch
    /// key, realigning the bucket it left.
    pub fn set_texture(
        &mut self,
        id: NodeID,
        texture: faro_ids::TextureID,
        buffers: &mut dyn BufferManager,
    ) {
        let Some(sprite) = self.nodes.get_mut(id).and_then(|n| n.as_sprite_mut()) else {
            warn!("set_texture: node {id} is not a sprite");
            return;
        };
        if sprite.texture == texture {
            return;
        }
        sprite.texture = texture;
        if self.nodes.get(id).is_some_and(|n| n.in_scene) {
            self.cache.refile_sprite(&mut self.nodes, id, buffers);
        }
    }

    pub fn set_sprite_color(
        &mut self,
        id: NodeID,
        color: Color,
        buffers: &mut dyn BufferManager,
    ) {
        let Some(sprite) = self.nodes.get_mut(id).and_then(|n| n.as_sprite_mut()) else {
            warn!("set_sprite_color: node {id} is not a sprite");
            return;
        };
        sprite.color = color;
        self.refresh_sprite_geometry(id, buffers);
    }

    /// Camera zoom. 1.0 = normal, >1.0 zooms in.
    pub fn set_zoom(&mut self, zoom: f32) {
        let camera = self.camera;
        if let Some(cam) = self.nodes.get_mut(camera).and_then(|n| n.as_camera_mut()) {
            cam.zoom = zoom;
            cam.view_dirty = true;
        } else {
            warn!("set_zoom: scene has no camera node");
            return;
        }
        self.mark_ui_dirty();
    }

    fn refresh_sprite_geometry(&mut self, id: NodeID, buffers: &mut dyn BufferManager) {
        let is_indexed_sprite = self
            .nodes
            .get(id)
            .is_some_and(|n| n.in_scene && n.as_sprite().is_some());
        if is_indexed_sprite {
            self.cache.update_sprite(&self.nodes, id, buffers);
        }
    }

    /// Stale-cache propagation: a spatial change on a node invalidates the
    /// world transform of the node and every descendant.
    fn mark_dirty_subtree(&mut self, id: NodeID) {
        let mut stack = vec![id];
        while let Some(nid) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(nid) {
                node.mark_dirty();
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// UI nodes fold the camera's inverse view into their transforms, so a
    /// camera change invalidates every UI subtree.
    fn mark_ui_dirty(&mut self) {
        let ui: Vec<NodeID> = self
            .cache
            .update_nodes()
            .iter()
            .copied()
            .filter(|&id| self.nodes.get(id).is_some_and(|n| n.is_ui))
            .collect();
        for id in ui {
            self.mark_dirty_subtree(id);
        }
    }

    // ---------------- transforms ----------------

    /// World transform of `id`: the ancestor chain's local transforms (root
    /// to parent) times this node's local transform. Cached; recomputed only
    /// while the dirty flag is set.
    pub fn world_transform(&mut self, id: NodeID) -> Mat4 {
        let Some(node) = self.nodes.get(id) else {
            warn!("world_transform: {}", SceneError::NotFound { node: id });
            return Mat4::IDENTITY;
        };
        if !node.transform_dirty {
            return node.world_transform;
        }
        let parent = node.parent;
        let parent_world = if parent.is_nil() {
            Mat4::IDENTITY
        } else {
            self.world_transform(parent)
        };

        let Some((mut local, is_ui, camera_id)) = self
            .nodes
            .get(id)
            .map(|n| (n.local_matrix(), n.is_ui, n.camera))
        else {
            return Mat4::IDENTITY;
        };
        if is_ui && !camera_id.is_nil() {
            // Camera-space node: cancel the view so it stays put on screen.
            local = self.camera_inverse_view(camera_id) * local;
        }
        let world = parent_world * local;
        if let Some(node) = self.nodes.get_mut(id) {
            node.local_transform = local;
            node.world_transform = world;
            node.transform_dirty = false;
        }
        world
    }

    pub fn view_matrix(&mut self) -> Mat4 {
        let camera = self.camera;
        let Some(position) = self.nodes.get(camera).map(|n| n.position) else {
            warn!("view_matrix: scene has no camera node");
            return Mat4::IDENTITY;
        };
        if let Some(cam) = self.nodes.get_mut(camera).and_then(|n| n.as_camera_mut()) {
            cam.refresh(position);
            cam.view
        } else {
            Mat4::IDENTITY
        }
    }

    fn camera_inverse_view(&mut self, camera_id: NodeID) -> Mat4 {
        let Some(position) = self.nodes.get(camera_id).map(|n| n.position) else {
            warn!("camera_inverse_view: {}", SceneError::NotFound { node: camera_id });
            return Mat4::IDENTITY;
        };
        if let Some(cam) = self
            .nodes
            .get_mut(camera_id)
            .and_then(|n| n.as_camera_mut())
        {
            cam.refresh(position);
            cam.inverse_view
        } else {
            warn!("camera_inverse_view: node {camera_id} is not a camera");
            Mat4::IDENTITY
        }
    }

    fn camera_state(&self) -> Option<(Vector2, f32)> {
        let node = self.nodes.get(self.camera)?;
        let camera = node.as_camera()?;
        Some((node.position, camera.zoom))
    }

    // ---------------- coordinate conversion ----------------

    /// Screen point (origin top-left, y down) to scene point (camera at the
    /// view center, y up). Exact inverse of [`Self::scene_to_view`].
    pub fn view_to_scene(&self, point: Vector2) -> Vector2 {
        let Some((position, zoom)) = self.camera_state() else {
            warn!("view_to_scene: scene has no camera, returning zero");
            return Vector2::zero();
        };
        Vector2::new(
            (point.x - self.view_size.width * 0.5) / zoom + position.x,
            (self.view_size.height * 0.5 - point.y) / zoom + position.y,
        )
    }

    pub fn scene_to_view(&self, point: Vector2) -> Vector2 {
        let Some((position, zoom)) = self.camera_state() else {
            warn!("scene_to_view: scene has no camera, returning zero");
            return Vector2::zero();
        };
        Vector2::new(
            (point.x - position.x) * zoom + self.view_size.width * 0.5,
            self.view_size.height * 0.5 - (point.y - position.y) * zoom,
        )
    }

    // ---------------- hit testing ----------------

    /// Axis-aligned bounding rect of `id` in scene space. Accumulates
    /// position offsets and scale products up the ancestor chain; rotation
    /// is not accounted for (known limitation, kept intentionally).
    pub fn frame(&self, id: NodeID) -> Rect {
        let Some(node) = self.nodes.get(id) else {
            warn!("frame: {}", SceneError::NotFound { node: id });
            return Rect::new(0.0, 0.0, 0.0, 0.0);
        };
        let (pos, scale) = self.accumulated_offset_scale(id);
        Rect::new(
            pos.x - node.anchor.x * node.size.width * scale.x,
            pos.y - node.anchor.y * node.size.height * scale.y,
            node.size.width * scale.x,
            node.size.height * scale.y,
        )
    }

    /// Every node whose frame contains `point`, in cache iteration order.
    /// No z ordering beyond that.
    pub fn nodes_at(&self, point: Vector2) -> Vec<NodeID> {
        self.cache
            .update_nodes()
            .iter()
            .copied()
            .filter(|&id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| !n.is_camera() && self.frame(id).contains(point))
            })
            .collect()
    }

    fn accumulated_offset_scale(&self, id: NodeID) -> (Vector2, Vector2) {
        let mut chain = Vec::new();
        let mut cursor = id;
        while !cursor.is_nil() {
            chain.push(cursor);
            cursor = self
                .nodes
                .get(cursor)
                .map(|n| n.parent)
                .unwrap_or_else(NodeID::nil);
        }
        let mut pos = Vector2::zero();
        let mut scale = Vector2::one();
        for &nid in chain.iter().rev() {
            let Some(node) = self.nodes.get(nid) else {
                continue;
            };
            if node.is_camera() {
                continue;
            }
            pos = pos + node.position * scale;
            scale = scale * node.scale;
        }
        (pos, scale)
    }

    // ---------------- actions ----------------

    /// Run `action` on `id`, silently replacing any action already there
    /// (the replaced action's completion handler does not fire).
    pub fn run_action(&mut self, id: NodeID, action: Action) {
        if !self.nodes.contains(id) {
            warn!("run_action: {}", SceneError::NotFound { node: id });
            return;
        }
        self.actions.insert(id, action);
    }

    /// Force-complete and detach the node's action; fires its completion
    /// handler like natural completion would.
    pub fn stop_action(&mut self, id: NodeID) {
        if let Some(mut action) = self.actions.remove(&id) {
            action.stop(id);
        }
    }

    pub fn has_action(&self, id: NodeID) -> bool {
        self.actions.contains_key(&id)
    }

    /// Drain due actions for every cached node, in cache order. Completed
    /// actions are dropped; running ones are put back.
    pub fn tick_actions(&mut self, delta: f32) {
        let mut ids = std::mem::take(&mut self.tick_scratch);
        ids.clear();
        ids.extend_from_slice(self.cache.update_nodes());

        for &id in &ids {
            let Some(mut action) = self.actions.remove(&id) else {
                continue;
            };
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            action.tick(node, delta);
            self.mark_dirty_subtree(id);
            if !action.completed {
                self.actions.insert(id, action);
            }
        }

        self.tick_scratch = ids;
    }

    // ---------------- frame extraction ----------------

    /// Snapshot everything the renderer needs this frame: fresh world
    /// transforms, per-type buckets in cache order, the camera view.
    /// Invisible nodes are skipped; their cache entries stay put.
    pub fn build_draw_list(&mut self) -> FrameDrawList {
        let view = self.view_matrix();
        let (camera_position, zoom) = self.camera_state().unwrap_or((Vector2::zero(), 1.0));
        let mut list = FrameDrawList {
            view: view.to_cols_array_2d(),
            camera: Camera2DState {
                position: [camera_position.x, camera_position.y],
                zoom,
                viewport: [self.view_size.width, self.view_size.height],
            },
            ambient_light: self.ambient_light_color.to_f32_array(),
            ..FrameDrawList::default()
        };

        for id in self.cache.shapes().to_vec() {
            let Some((visible, size, color, z)) = self.nodes.get(id).and_then(|n| match &n.data
            {
                faro_nodes::SceneNodeData::Shape2D(shape) => {
                    Some((n.visible, n.size, shape.color, n.z_position))
                }
                _ => None,
            }) else {
                continue;
            };
            if !visible {
                continue;
            }
            let world = self.world_transform(id).to_cols_array_2d();
            list.shapes.push(ShapeDraw {
                node: id,
                world,
                size: [size.width, size.height],
                color: color.to_f32_array(),
                z_position: z,
            });
        }

        let buckets: Vec<_> = self
            .cache
            .sprite_buckets()
            .map(|(texture, bucket)| (texture, bucket.buffer, bucket.nodes.clone()))
            .collect();
        for (texture, buffer, nodes) in buckets {
            let mut sprites = Vec::with_capacity(nodes.len());
            for id in nodes {
                let Some((visible, buffer_index)) = self
                    .nodes
                    .get(id)
                    .and_then(|n| n.as_sprite().map(|s| (n.visible, s.buffer_index)))
                else {
                    continue;
                };
                if !visible {
                    continue;
                }
                let world = self.world_transform(id).to_cols_array_2d();
                sprites.push(SpriteDraw {
                    node: id,
                    buffer_index,
                    world,
                });
            }
            if !sprites.is_empty() {
                list.sprite_batches.push(SpriteBatch {
                    texture,
                    buffer,
                    sprites,
                });
            }
        }

        for id in self.cache.texts().to_vec() {
            let Some((visible, content, font_size, color, z)) =
                self.nodes.get(id).and_then(|n| match &n.data {
                    faro_nodes::SceneNodeData::Text2D(text) => Some((
                        n.visible,
                        text.content.clone(),
                        text.font_size,
                        text.color,
                        n.z_position,
                    )),
                    _ => None,
                })
            else {
                continue;
            };
            if !visible {
                continue;
            }
            let world = self.world_transform(id).to_cols_array_2d();
            list.texts.push(TextDraw {
                node: id,
                world,
                content,
                font_size,
                color: color.to_f32_array(),
                z_position: z,
            });
        }

        for id in self.cache.lights().to_vec() {
            let Some((visible, light, pivot)) = self.nodes.get(id).and_then(|n| {
                n.as_light().map(|l| {
                    (
                        n.visible,
                        *l,
                        Vec3::new(
                            n.anchor.x * n.size.width,
                            n.anchor.y * n.size.height,
                            0.0,
                        ),
                    )
                })
            }) else {
                continue;
            };
            if !visible {
                continue;
            }
            let world = self.world_transform(id);
            let world_position = world.transform_point3(pivot);
            list.lights.push(LightDraw {
                node: id,
                light_index: light.light_index,
                world_position: [world_position.x, world_position.y],
                color: light.color.to_f32_array(),
                intensity: light.intensity,
                falloff: light.falloff,
            });
        }

        list
    }
}
