//! Flat, type-partitioned index over every node live in a scene.
//!
//! `update_nodes` drives the per-frame traversal; shapes, texts, and lights
//! sit in flat lists, sprites in per-texture buckets so the renderer can draw
//! each bucket as one instanced call. A sprite's recorded `buffer_index` is
//! always its position inside its bucket's backing buffer — removal rewrites
//! every subsequent sprite's region to keep the indices contiguous. That
//! realignment cost is the price of the one-draw-call-per-texture batching.

use ahash::AHashSet;
use faro_ids::{BufferID, NodeID, TextureID};
use faro_nodes::{NodeArena, NodeKind};
use faro_render_bridge::{BufferManager, SPRITE_INSTANCE_STRIDE, SpriteInstance};
use indexmap::IndexMap;
use log::{debug, warn};

/// Instance headroom reserved per batch buffer at allocation.
pub const SPRITE_BUCKET_CAPACITY: usize = 500;

/// Every sprite sharing one texture key, in draw order, plus the batched
/// GPU buffer they live in.
pub struct SpriteBucket {
    pub buffer: BufferID,
    pub nodes: Vec<NodeID>,
}

pub struct GraphCache {
    update_nodes: Vec<NodeID>,
    indexed: AHashSet<NodeID>,
    shapes: Vec<NodeID>,
    sprites: IndexMap<TextureID, SpriteBucket>,
    texts: Vec<NodeID>,
    lights: Vec<NodeID>,
    bucket_capacity: usize,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::with_bucket_capacity(SPRITE_BUCKET_CAPACITY)
    }

    pub fn with_bucket_capacity(bucket_capacity: usize) -> Self {
        Self {
            update_nodes: Vec::new(),
            indexed: AHashSet::new(),
            shapes: Vec::new(),
            sprites: IndexMap::new(),
            texts: Vec::new(),
            lights: Vec::new(),
            bucket_capacity: bucket_capacity.max(1),
        }
    }

    pub fn update_nodes(&self) -> &[NodeID] {
        &self.update_nodes
    }

    pub fn shapes(&self) -> &[NodeID] {
        &self.shapes
    }

    pub fn texts(&self) -> &[NodeID] {
        &self.texts
    }

    pub fn lights(&self) -> &[NodeID] {
        &self.lights
    }

    pub fn sprite_buckets(&self) -> impl Iterator<Item = (TextureID, &SpriteBucket)> {
        self.sprites.iter().map(|(key, bucket)| (*key, bucket))
    }

    pub fn sprite_bucket(&self, key: TextureID) -> Option<&SpriteBucket> {
        self.sprites.get(&key)
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.indexed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.update_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.update_nodes.is_empty()
    }

    /// Add `id` to the update list only. Used for nodes with nothing to
    /// draw (plain nodes, cameras) and as the common entry for `add`.
    pub(crate) fn track(&mut self, id: NodeID) -> bool {
        if !self.indexed.insert(id) {
            debug!("graph cache: node {id} already indexed, skipping");
            return false;
        }
        self.update_nodes.push(id);
        true
    }

    /// Index one node. Callers walk subtrees in paint order and invoke this
    /// per node; render-relevant kinds are filed into their bucket, sprites
    /// get their instance data written into the batch buffer.
    pub fn add(&mut self, arena: &mut NodeArena, id: NodeID, buffers: &mut dyn BufferManager) {
        if !self.track(id) {
            return;
        }
        let Some(kind) = arena.get(id).map(|n| n.data.kind()) else {
            return;
        };
        match kind {
            NodeKind::Shape2D => self.shapes.push(id),
            NodeKind::Text2D => self.texts.push(id),
            NodeKind::Light2D => {
                let light_index = self.lights.len() as u32;
                self.lights.push(id);
                if let Some(light) = arena.get_mut(id).and_then(|n| n.as_light_mut()) {
                    light.light_index = light_index;
                }
            }
            NodeKind::Sprite2D => self.add_sprite(arena, id, buffers),
            NodeKind::Node | NodeKind::Camera2D => {}
        }
    }

    /// Drop one node from the cache and its bucket. Sprite removal realigns
    /// the bucket; light removal renumbers later lights.
    pub fn remove(&mut self, arena: &mut NodeArena, id: NodeID, buffers: &mut dyn BufferManager) {
        if !self.indexed.remove(&id) {
            return;
        }
        self.update_nodes.retain(|&n| n != id);
        let Some(kind) = arena.get(id).map(|n| n.data.kind()) else {
            return;
        };
        match kind {
            NodeKind::Shape2D => self.shapes.retain(|&n| n != id),
            NodeKind::Text2D => self.texts.retain(|&n| n != id),
            NodeKind::Light2D => self.remove_light(arena, id),
            NodeKind::Sprite2D => self.remove_sprite(arena, id, buffers),
            NodeKind::Node | NodeKind::Camera2D => {}
        }
    }

    /// Rewrite a sprite's instance data at its existing index after a
    /// geometry change (size, anchor, color, z). Bucket order and other
    /// nodes' indices are untouched.
    pub fn update_sprite(
        &mut self,
        arena: &NodeArena,
        id: NodeID,
        buffers: &mut dyn BufferManager,
    ) {
        let Some(sprite) = arena.get(id).and_then(|n| n.as_sprite()) else {
            warn!("graph cache: update_sprite on non-sprite node {id}");
            return;
        };
        let Some(bucket) = self.sprites.get(&sprite.bucket_key) else {
            warn!("graph cache: sprite {id} has no bucket, skipping update");
            return;
        };
        debug_assert_eq!(bucket.nodes.get(sprite.buffer_index), Some(&id));
        write_sprite_instance(arena, id, bucket.buffer, sprite.buffer_index, buffers);
    }

    /// Refile a sprite whose texture key changed: evict from the old bucket
    /// (realigning it) and append under the new key.
    pub fn refile_sprite(
        &mut self,
        arena: &mut NodeArena,
        id: NodeID,
        buffers: &mut dyn BufferManager,
    ) {
        if !self.indexed.contains(&id) {
            return;
        }
        self.remove_sprite(arena, id, buffers);
        self.add_sprite(arena, id, buffers);
    }

    fn add_sprite(&mut self, arena: &mut NodeArena, id: NodeID, buffers: &mut dyn BufferManager) {
        let Some(key) = arena.get(id).and_then(|n| n.as_sprite()).map(|s| s.texture) else {
            return;
        };
        let capacity = self.bucket_capacity;
        let (buffer, index) = {
            let bucket = self.sprites.entry(key).or_insert_with(|| {
                debug!("graph cache: allocating sprite batch buffer for texture {key}");
                SpriteBucket {
                    buffer: buffers.allocate(capacity * SPRITE_INSTANCE_STRIDE),
                    nodes: Vec::with_capacity(capacity.min(64)),
                }
            });
            let index = bucket.nodes.len();
            bucket.nodes.push(id);
            (bucket.buffer, index)
        };
        if let Some(sprite) = arena.get_mut(id).and_then(|n| n.as_sprite_mut()) {
            sprite.buffer_index = index;
            sprite.bucket_key = key;
        }
        write_sprite_instance(arena, id, buffer, index, buffers);
    }

    fn remove_sprite(
        &mut self,
        arena: &mut NodeArena,
        id: NodeID,
        buffers: &mut dyn BufferManager,
    ) {
        let Some((key, recorded)) = arena
            .get(id)
            .and_then(|n| n.as_sprite())
            .map(|s| (s.bucket_key, s.buffer_index))
        else {
            return;
        };
        let (buffer, pos, tail, now_empty) = {
            let Some(bucket) = self.sprites.get_mut(&key) else {
                warn!("graph cache: sprite {id} filed under missing bucket {key}");
                return;
            };
            let pos = if bucket.nodes.get(recorded) == Some(&id) {
                recorded
            } else {
                // Index out of sync with the bucket; fall back to a search.
                warn!("graph cache: sprite {id} index {recorded} out of sync, searching bucket");
                match bucket.nodes.iter().position(|&n| n == id) {
                    Some(pos) => pos,
                    None => return,
                }
            };
            bucket.nodes.remove(pos);
            (
                bucket.buffer,
                pos,
                bucket.nodes[pos..].to_vec(),
                bucket.nodes.is_empty(),
            )
        };

        // Realign: every sprite after the removed one moves down a slot, its
        // recorded index and its region of the shared buffer both rewritten.
        for (offset, nid) in tail.iter().enumerate() {
            let new_index = pos + offset;
            if let Some(sprite) = arena.get_mut(*nid).and_then(|n| n.as_sprite_mut()) {
                sprite.buffer_index = new_index;
            }
            write_sprite_instance(arena, *nid, buffer, new_index, buffers);
        }

        if let Some(sprite) = arena.get_mut(id).and_then(|n| n.as_sprite_mut()) {
            sprite.bucket_key = TextureID::nil();
            sprite.buffer_index = 0;
        }
        if now_empty {
            debug!("graph cache: releasing empty sprite batch buffer for texture {key}");
            self.sprites.shift_remove(&key);
            buffers.release(buffer);
        }
    }

    fn remove_light(&mut self, arena: &mut NodeArena, id: NodeID) {
        let Some(pos) = self.lights.iter().position(|&n| n == id) else {
            return;
        };
        self.lights.remove(pos);
        // Later lights slide down one slot in the renderer's light table.
        for (index, nid) in self.lights.iter().enumerate().skip(pos) {
            if let Some(light) = arena.get_mut(*nid).and_then(|n| n.as_light_mut()) {
                light.light_index = index as u32;
            }
        }
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the quad instance for `id` from its node and upload it at
/// `instance_index` of `buffer`.
fn write_sprite_instance(
    arena: &NodeArena,
    id: NodeID,
    buffer: BufferID,
    instance_index: usize,
    buffers: &mut dyn BufferManager,
) {
    let Some(node) = arena.get(id) else {
        return;
    };
    let Some(sprite) = node.as_sprite() else {
        return;
    };
    let instance = SpriteInstance {
        size: [node.size.width, node.size.height],
        anchor: [node.anchor.x, node.anchor.y],
        color: sprite.color.to_f32_array(),
        z_position: node.z_position as f32,
        _pad: [0.0; 3],
    };
    buffers.write(buffer, bytemuck::bytes_of(&instance), instance_index);
}
