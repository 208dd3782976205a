//! The per-frame driver. An external display link calls
//! [`View::update`] once per vsync tick; the view claims a frame slot,
//! drains due actions over the scene cache, runs the application hook, and
//! hands the frame draw list to the renderer.

use crate::config::ViewConfig;
use crate::frame_ring::{FrameRing, FrameSignal};
use faro_ids::NodeID;
use faro_nodes::SceneNode;
use faro_render_bridge::{BufferManager, FrameRenderer};
use faro_scene::Scene;
use faro_structs::Size;

/// Application hook, called once per frame after actions drain. Default is
/// a no-op.
pub trait AppDelegate {
    fn update(&mut self, scene: &mut Scene, buffers: &mut dyn BufferManager, delta: f32) {
        let _ = (scene, buffers, delta);
    }
}

pub struct NoopDelegate;

impl AppDelegate for NoopDelegate {}

pub struct View<D, R, B> {
    scene: Scene,
    delegate: D,
    renderer: R,
    buffers: B,
    ring: FrameRing,
    /// Pausing skips the action drain and the app hook; the scene still
    /// renders.
    pub is_paused: bool,
    elapsed: f32,
}

impl<D, R, B> View<D, R, B>
where
    D: AppDelegate,
    R: FrameRenderer,
    B: BufferManager,
{
    pub fn new(config: &ViewConfig, delegate: D, renderer: R, buffers: B) -> Self {
        Self {
            scene: Scene::with_bucket_capacity(
                Size::new(config.width, config.height),
                config.sprite_bucket_capacity,
            ),
            delegate,
            renderer,
            buffers,
            ring: FrameRing::new(config.in_flight_frames),
            is_paused: false,
            elapsed: 0.0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Handle the renderer uses to release frame slots once the GPU is done
    /// with a frame's buffers.
    pub fn frame_signal(&self) -> FrameSignal {
        self.ring.signaler()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // Convenience passthroughs pairing the scene with its buffer manager.

    pub fn add(&mut self, node: SceneNode) -> NodeID {
        self.scene.add(node, &mut self.buffers)
    }

    pub fn add_ui(&mut self, node: SceneNode) -> NodeID {
        self.scene.add_ui(node, &mut self.buffers)
    }

    pub fn add_child(&mut self, parent: NodeID, node: SceneNode) -> NodeID {
        self.scene.add_child(parent, node, &mut self.buffers)
    }

    pub fn remove(&mut self, id: NodeID) -> Option<NodeID> {
        self.scene.remove(id, &mut self.buffers)
    }

    /// One frame: claim a slot in the in-flight ring (blocks the driver if
    /// the GPU is `depth` frames behind), drain actions, run the app hook,
    /// submit the draw list.
    pub fn update(&mut self, delta: f32) {
        self.ring.acquire();
        if !self.is_paused {
            self.elapsed += delta;
            self.scene.tick_actions(delta);
            self.delegate
                .update(&mut self.scene, &mut self.buffers, delta);
        }
        let frame = self.scene.build_draw_list();
        self.renderer.draw_frame(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faro_actions::Action;
    use faro_ids::BufferID;
    use faro_nodes::{SceneNodeData, Shape2D};
    use faro_render_bridge::FrameDrawList;
    use faro_structs::{Color, Size, Vector2};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct NullBuffers {
        next: u32,
    }

    impl BufferManager for NullBuffers {
        fn allocate(&mut self, _byte_len: usize) -> BufferID {
            self.next += 1;
            BufferID::from_parts(self.next, 0)
        }

        fn write(&mut self, _buffer: BufferID, _bytes: &[u8], _instance_index: usize) {}

        fn release(&mut self, _buffer: BufferID) {}
    }

    /// Renderer double: records frames and frees the ring slot immediately,
    /// like a GPU that never falls behind.
    struct RecordingRenderer {
        frames: Rc<RefCell<Vec<FrameDrawList>>>,
        signal: Option<FrameSignal>,
    }

    impl FrameRenderer for RecordingRenderer {
        fn draw_frame(&mut self, frame: &FrameDrawList) {
            self.frames.borrow_mut().push(frame.clone());
            if let Some(signal) = &self.signal {
                signal.signal();
            }
        }
    }

    fn test_view() -> (
        View<NoopDelegate, RecordingRenderer, NullBuffers>,
        Rc<RefCell<Vec<FrameDrawList>>>,
    ) {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let config = ViewConfig {
            width: 800.0,
            height: 600.0,
            ..ViewConfig::default()
        };
        let mut view = View::new(
            &config,
            NoopDelegate,
            RecordingRenderer {
                frames: frames.clone(),
                signal: None,
            },
            NullBuffers::default(),
        );
        view.renderer.signal = Some(view.frame_signal());
        (view, frames)
    }

    fn shape_at(x: f32, y: f32) -> SceneNode {
        SceneNode::new(SceneNodeData::Shape2D(Shape2D::new(Color::WHITE)))
            .with_size(Size::new(8.0, 8.0))
            .with_position(Vector2::new(x, y))
    }

    #[test]
    fn update_drains_actions_and_submits_frames() {
        let (mut view, frames) = test_view();
        let id = view.add(shape_at(0.0, 0.0));
        view.scene_mut()
            .run_action(id, Action::move_by(100.0, 0.0, 2.0));

        view.update(1.0);
        assert_relative_eq!(
            view.scene().node(id).unwrap().position.x,
            50.0,
            epsilon = 1e-3
        );
        view.update(1.0);
        assert_eq!(view.scene().node(id).unwrap().position.x, 100.0);

        let frames = frames.borrow();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].shapes.len(), 1);
        assert_eq!(frames[1].shapes[0].node, id);
    }

    #[test]
    fn paused_view_renders_without_advancing_actions() {
        let (mut view, frames) = test_view();
        let id = view.add(shape_at(0.0, 0.0));
        view.scene_mut()
            .run_action(id, Action::move_by(100.0, 0.0, 1.0));

        view.is_paused = true;
        view.update(1.0);

        assert_eq!(view.scene().node(id).unwrap().position.x, 0.0);
        assert_eq!(view.elapsed(), 0.0);
        assert_eq!(frames.borrow().len(), 1);

        view.is_paused = false;
        view.update(1.0);
        assert_eq!(view.scene().node(id).unwrap().position.x, 100.0);
    }

    #[test]
    fn delegate_hook_runs_each_frame_with_buffer_access() {
        struct Spawner {
            ticks: u32,
        }

        impl AppDelegate for Spawner {
            fn update(&mut self, scene: &mut Scene, buffers: &mut dyn BufferManager, _delta: f32) {
                self.ticks += 1;
                if self.ticks == 1 {
                    scene.add(
                        SceneNode::new(SceneNodeData::Shape2D(Shape2D::new(Color::BLACK)))
                            .with_size(Size::new(2.0, 2.0)),
                        buffers,
                    );
                }
            }
        }

        let frames = Rc::new(RefCell::new(Vec::new()));
        let config = ViewConfig::default();
        let mut view = View::new(
            &config,
            Spawner { ticks: 0 },
            RecordingRenderer {
                frames: frames.clone(),
                signal: None,
            },
            NullBuffers::default(),
        );
        view.renderer.signal = Some(view.frame_signal());

        view.update(0.016);
        view.update(0.016);

        assert_eq!(view.delegate.ticks, 2);
        assert_eq!(frames.borrow()[0].shapes.len(), 1);
        assert_eq!(view.scene().cache().shapes().len(), 1);
    }
}
