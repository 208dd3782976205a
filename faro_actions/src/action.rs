use crate::easing::Easing;
use faro_ids::NodeID;
use faro_nodes::SceneNode;
use faro_structs::Vector2;
use std::fmt;

pub type CompletionHandler = Box<dyn FnMut(NodeID)>;

/// What an action animates. Leaf variants carry an explicit start snapshot,
/// captured on the first tick; every subsequent tick interpolates from that
/// snapshot so repeated small deltas cannot drift.
#[derive(Debug)]
pub enum ActionKind {
    MoveTo {
        target: Vector2,
        start: Option<Vector2>,
    },
    MoveBy {
        amount: Vector2,
        start: Option<Vector2>,
    },
    RotateBy {
        degrees: f32,
        start: Option<f32>,
    },
    ScaleBy {
        factor: f32,
        start: Option<Vector2>,
    },
    ScaleByXY {
        x: f32,
        y: f32,
        start: Option<Vector2>,
    },
    ScaleTo {
        target: f32,
        start: Option<Vector2>,
    },
    Sequence {
        children: Vec<Action>,
        index: usize,
    },
    Group {
        children: Vec<Action>,
    },
}

/// A time-based mutation of one node's spatial properties.
///
/// State machine per instance: idle (never ticked) → running → completed.
/// `repeat_forever` wraps back instead of completing. A node holds at most
/// one action; assigning a new one silently replaces the old without firing
/// its completion handler.
pub struct Action {
    pub kind: ActionKind,
    /// Seconds. Zero or negative means instant completion on the first tick.
    pub duration: f32,
    pub elapsed: f32,
    pub completed: bool,
    pub repeats_forever: bool,
    pub easing: Easing,
    on_complete: Option<CompletionHandler>,
}

impl Action {
    fn with_kind(kind: ActionKind, duration: f32) -> Self {
        Self {
            kind,
            duration,
            elapsed: 0.0,
            completed: false,
            repeats_forever: false,
            easing: Easing::Linear,
            on_complete: None,
        }
    }

    pub fn move_to(x: f32, y: f32, duration: f32) -> Self {
        Self::with_kind(
            ActionKind::MoveTo {
                target: Vector2::new(x, y),
                start: None,
            },
            duration,
        )
    }

    pub fn move_by(x: f32, y: f32, duration: f32) -> Self {
        Self::with_kind(
            ActionKind::MoveBy {
                amount: Vector2::new(x, y),
                start: None,
            },
            duration,
        )
    }

    pub fn rotate_by(degrees: f32, duration: f32) -> Self {
        Self::with_kind(
            ActionKind::RotateBy {
                degrees,
                start: None,
            },
            duration,
        )
    }

    pub fn scale_by(factor: f32, duration: f32) -> Self {
        Self::with_kind(ActionKind::ScaleBy { factor, start: None }, duration)
    }

    pub fn scale_by_xy(x: f32, y: f32, duration: f32) -> Self {
        Self::with_kind(ActionKind::ScaleByXY { x, y, start: None }, duration)
    }

    pub fn scale_to(target: f32, duration: f32) -> Self {
        Self::with_kind(ActionKind::ScaleTo { target, start: None }, duration)
    }

    /// Runs `children` one after another; duration is their sum.
    pub fn sequence(children: Vec<Action>) -> Self {
        let duration = children.iter().map(|c| c.duration.max(0.0)).sum();
        Self::with_kind(ActionKind::Sequence { children, index: 0 }, duration)
    }

    /// Runs `children` simultaneously; duration is the longest child's.
    pub fn group(children: Vec<Action>) -> Self {
        let duration = children
            .iter()
            .map(|c| c.duration.max(0.0))
            .fold(0.0_f32, f32::max);
        Self::with_kind(ActionKind::Group { children }, duration)
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat_forever(mut self) -> Self {
        self.repeats_forever = true;
        self
    }

    pub fn on_complete(mut self, handler: impl FnMut(NodeID) + 'static) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    /// Advance by `delta` seconds, mutating `node`. Returns the unconsumed
    /// part of `delta` — non-zero only when the action completed mid-tick,
    /// so sequences can hand the remainder to the next child and keep the
    /// end state independent of step granularity.
    pub fn tick(&mut self, node: &mut SceneNode, delta: f32) -> f32 {
        if self.completed {
            return delta;
        }
        match self.kind {
            ActionKind::Sequence { .. } => self.tick_sequence(node, delta),
            ActionKind::Group { .. } => self.tick_group(node, delta),
            _ => self.tick_leaf(node, delta),
        }
    }

    /// Force completion now; fires the completion handler exactly as natural
    /// completion would.
    pub fn stop(&mut self, node_id: NodeID) {
        if self.completed {
            return;
        }
        self.finish(node_id);
    }

    fn tick_leaf(&mut self, node: &mut SceneNode, delta: f32) -> f32 {
        // Degenerate duration: jump to the end state, complete immediately.
        // Repeat-forever is ignored here; wrapping a zero-length action would
        // spin without progress.
        if self.duration <= 0.0 {
            self.snapshot_start(node);
            self.apply(node, 1.0);
            self.finish(node.id);
            return delta.max(0.0);
        }

        self.snapshot_start(node);
        let before = self.elapsed;
        self.elapsed = (before + delta).min(self.duration);
        let consumed = self.elapsed - before;
        let t = self.elapsed / self.duration;
        let eased = self.easing.value(t);
        self.apply(node, eased);

        if self.elapsed >= self.duration {
            if self.repeats_forever {
                self.elapsed = 0.0;
                self.clear_start();
                return 0.0;
            }
            self.finish(node.id);
        }
        delta - consumed
    }

    fn tick_sequence(&mut self, node: &mut SceneNode, delta: f32) -> f32 {
        let mut rem = delta;
        let mut wraps = 0;
        loop {
            let ActionKind::Sequence { children, index } = &mut self.kind else {
                return rem;
            };
            if *index >= children.len() {
                if self.repeats_forever {
                    // Wrap: reset the children about to run again. One wrap
                    // per tick keeps zero-length cycles from spinning.
                    *index = 0;
                    for child in children.iter_mut() {
                        child.reset();
                    }
                    wraps += 1;
                    if rem <= 0.0 || wraps > 1 || children.is_empty() {
                        return 0.0;
                    }
                    continue;
                }
                break;
            }

            let child = &mut children[*index];
            rem = child.tick(node, rem);
            if !child.completed {
                return 0.0;
            }
            *index += 1;
            if rem <= 0.0 && *index < children.len() {
                return 0.0;
            }
        }

        self.elapsed = self.duration;
        self.finish(node.id);
        rem
    }

    fn tick_group(&mut self, node: &mut SceneNode, delta: f32) -> f32 {
        let ActionKind::Group { children } = &mut self.kind else {
            return delta;
        };
        for child in children.iter_mut() {
            if !child.completed {
                child.tick(node, delta);
            }
        }

        self.elapsed += delta;
        if self.elapsed >= self.duration {
            if self.repeats_forever {
                self.elapsed = 0.0;
                let ActionKind::Group { children } = &mut self.kind else {
                    return 0.0;
                };
                for child in children.iter_mut() {
                    child.reset();
                }
                return 0.0;
            }
            let leftover = (self.elapsed - self.duration).clamp(0.0, delta);
            self.elapsed = self.duration;
            self.finish(node.id);
            return leftover;
        }
        0.0
    }

    fn snapshot_start(&mut self, node: &SceneNode) {
        match &mut self.kind {
            ActionKind::MoveTo { start, .. } | ActionKind::MoveBy { start, .. } => {
                if start.is_none() {
                    *start = Some(node.position);
                }
            }
            ActionKind::RotateBy { start, .. } => {
                if start.is_none() {
                    *start = Some(node.rotation);
                }
            }
            ActionKind::ScaleBy { start, .. }
            | ActionKind::ScaleByXY { start, .. }
            | ActionKind::ScaleTo { start, .. } => {
                if start.is_none() {
                    *start = Some(node.scale);
                }
            }
            ActionKind::Sequence { .. } | ActionKind::Group { .. } => {}
        }
    }

    fn clear_start(&mut self) {
        match &mut self.kind {
            ActionKind::MoveTo { start, .. } | ActionKind::MoveBy { start, .. } => *start = None,
            ActionKind::RotateBy { start, .. } => *start = None,
            ActionKind::ScaleBy { start, .. }
            | ActionKind::ScaleByXY { start, .. }
            | ActionKind::ScaleTo { start, .. } => *start = None,
            ActionKind::Sequence { .. } | ActionKind::Group { .. } => {}
        }
    }

    /// Write the interpolated value for eased progress `eased` (0..1),
    /// always absolute from the start snapshot.
    fn apply(&mut self, node: &mut SceneNode, eased: f32) {
        match &self.kind {
            ActionKind::MoveTo { target, start } => {
                let from = start.unwrap_or(node.position);
                node.position = Vector2::lerp(from, *target, eased);
            }
            ActionKind::MoveBy { amount, start } => {
                let from = start.unwrap_or(node.position);
                node.position = from + *amount * eased;
            }
            ActionKind::RotateBy { degrees, start } => {
                let from = start.unwrap_or(node.rotation);
                node.rotation = from + degrees * eased;
            }
            ActionKind::ScaleBy { factor, start } => {
                let from = start.unwrap_or(node.scale);
                node.scale = from * (1.0 + (factor - 1.0) * eased);
            }
            ActionKind::ScaleByXY { x, y, start } => {
                let from = start.unwrap_or(node.scale);
                node.scale = Vector2::new(
                    from.x * (1.0 + (x - 1.0) * eased),
                    from.y * (1.0 + (y - 1.0) * eased),
                );
            }
            ActionKind::ScaleTo { target, start } => {
                let from = start.unwrap_or(node.scale);
                node.scale = Vector2::lerp(from, Vector2::new(*target, *target), eased);
            }
            ActionKind::Sequence { .. } | ActionKind::Group { .. } => {}
        }
    }

    fn finish(&mut self, node_id: NodeID) {
        self.completed = true;
        if let Some(mut handler) = self.on_complete.take() {
            handler(node_id);
        }
    }

    /// Back to the idle state: timers zeroed, snapshots cleared, cursors
    /// rewound, ready to run again.
    fn reset(&mut self) {
        self.elapsed = 0.0;
        self.completed = false;
        self.clear_start();
        match &mut self.kind {
            ActionKind::Sequence { children, index } => {
                *index = 0;
                for child in children.iter_mut() {
                    child.reset();
                }
            }
            ActionKind::Group { children } => {
                for child in children.iter_mut() {
                    child.reset();
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("completed", &self.completed)
            .field("repeats_forever", &self.repeats_forever)
            .field("easing", &self.easing)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faro_nodes::SceneNodeData;
    use std::cell::Cell;
    use std::rc::Rc;

    fn node_at(x: f32, y: f32) -> SceneNode {
        SceneNode::new(SceneNodeData::Node).with_position(Vector2::new(x, y))
    }

    #[test]
    fn move_by_two_halves() {
        let mut node = node_at(0.0, 0.0);
        let mut action = Action::move_by(100.0, 0.0, 2.0);

        action.tick(&mut node, 1.0);
        assert!((node.position.x - 50.0).abs() < 1e-4);
        assert!(!action.completed);

        action.tick(&mut node, 1.0);
        assert_eq!(node.position.x, 100.0);
        assert!(action.completed);
    }

    #[test]
    fn move_to_end_state_independent_of_step_granularity() {
        let mut coarse = node_at(3.0, -2.0);
        let mut fine = node_at(3.0, -2.0);

        let mut one_step = Action::move_to(40.0, 10.0, 1.0);
        one_step.tick(&mut coarse, 1.0);

        let mut many_steps = Action::move_to(40.0, 10.0, 1.0);
        for _ in 0..4 {
            many_steps.tick(&mut fine, 0.25);
        }

        assert_eq!(coarse.position, fine.position);
        assert_eq!(coarse.position, Vector2::new(40.0, 10.0));
        assert!(one_step.completed && many_steps.completed);
    }

    #[test]
    fn rotate_and_scale_interpolate_from_snapshot() {
        let mut node = node_at(0.0, 0.0);
        node.rotation = 10.0;
        node.scale = Vector2::new(2.0, 2.0);

        let mut rotate = Action::rotate_by(90.0, 1.0);
        rotate.tick(&mut node, 0.5);
        assert!((node.rotation - 55.0).abs() < 1e-4);
        rotate.tick(&mut node, 0.5);
        assert_eq!(node.rotation, 100.0);

        let mut scale = Action::scale_by(3.0, 1.0);
        scale.tick(&mut node, 1.0);
        assert_eq!(node.scale, Vector2::new(6.0, 6.0));

        let mut scale_to = Action::scale_to(1.0, 1.0);
        scale_to.tick(&mut node, 1.0);
        assert_eq!(node.scale, Vector2::one());
    }

    #[test]
    fn sequence_duration_is_sum_group_duration_is_max() {
        let seq = Action::sequence(vec![
            Action::move_by(1.0, 0.0, 0.5),
            Action::move_by(1.0, 0.0, 1.5),
            Action::move_by(1.0, 0.0, 1.0),
        ]);
        assert_eq!(seq.duration, 3.0);

        let group = Action::group(vec![
            Action::move_by(1.0, 0.0, 0.5),
            Action::rotate_by(90.0, 2.0),
            Action::scale_by(2.0, 1.0),
        ]);
        assert_eq!(group.duration, 2.0);
    }

    #[test]
    fn sequence_carries_leftover_delta_across_children() {
        let mut node = node_at(0.0, 0.0);
        let mut seq = Action::sequence(vec![
            Action::move_by(10.0, 0.0, 1.0),
            Action::move_by(0.0, 10.0, 1.0),
        ]);

        // One big tick covers both children.
        seq.tick(&mut node, 2.0);
        assert_eq!(node.position, Vector2::new(10.0, 10.0));
        assert!(seq.completed);
    }

    #[test]
    fn sequence_advances_only_on_child_completion() {
        let mut node = node_at(0.0, 0.0);
        let mut seq = Action::sequence(vec![
            Action::move_by(10.0, 0.0, 1.0),
            Action::move_by(0.0, 10.0, 1.0),
        ]);

        seq.tick(&mut node, 0.5);
        assert_eq!(node.position, Vector2::new(5.0, 0.0));
        seq.tick(&mut node, 0.5);
        assert_eq!(node.position, Vector2::new(10.0, 0.0));
        assert!(!seq.completed);
        seq.tick(&mut node, 1.0);
        assert_eq!(node.position, Vector2::new(10.0, 10.0));
        assert!(seq.completed);
    }

    #[test]
    fn group_completes_with_longest_child() {
        let mut node = node_at(0.0, 0.0);
        let mut group = Action::group(vec![
            Action::move_by(10.0, 0.0, 1.0),
            Action::rotate_by(90.0, 2.0),
        ]);

        group.tick(&mut node, 1.0);
        assert_eq!(node.position.x, 10.0);
        assert!((node.rotation - 45.0).abs() < 1e-4);
        assert!(!group.completed);

        group.tick(&mut node, 1.0);
        assert_eq!(node.rotation, 90.0);
        assert!(group.completed);
    }

    #[test]
    fn zero_duration_completes_instantly_at_end_state() {
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();

        let mut node = node_at(0.0, 0.0);
        let mut action = Action::move_to(7.0, 7.0, 0.0).on_complete(move |_| flag.set(true));
        action.tick(&mut node, 0.016);

        assert_eq!(node.position, Vector2::new(7.0, 7.0));
        assert!(action.completed);
        assert!(fired.get());
    }

    #[test]
    fn stop_fires_completion_handler() {
        let fired = Rc::new(Cell::new(0u32));
        let counter = fired.clone();

        let mut node = node_at(0.0, 0.0);
        let mut action =
            Action::move_by(100.0, 0.0, 10.0).on_complete(move |_| counter.set(counter.get() + 1));
        action.tick(&mut node, 1.0);
        action.stop(node.id);

        assert!(action.completed);
        assert_eq!(fired.get(), 1);
        // Stopping again does not re-fire.
        action.stop(node.id);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn repeat_forever_sequence_wraps_and_resets() {
        let mut node = node_at(0.0, 0.0);
        let mut seq =
            Action::sequence(vec![Action::move_by(10.0, 0.0, 1.0)]).repeat_forever();

        seq.tick(&mut node, 1.0);
        assert_eq!(node.position.x, 10.0);
        assert!(!seq.completed);

        // Second cycle starts from the new position snapshot.
        seq.tick(&mut node, 0.5);
        assert_eq!(node.position.x, 15.0);
        seq.tick(&mut node, 0.5);
        assert_eq!(node.position.x, 20.0);
        assert!(!seq.completed);
    }

    #[test]
    fn repeat_forever_leaf_absorbs_remainder_on_wrap() {
        let mut node = node_at(0.0, 0.0);
        let mut action = Action::move_by(10.0, 0.0, 1.0).repeat_forever();

        // 1.5s tick: completes one cycle, wraps, remainder dropped.
        let leftover = action.tick(&mut node, 1.5);
        assert_eq!(leftover, 0.0);
        assert_eq!(node.position.x, 10.0);
        assert!(!action.completed);

        action.tick(&mut node, 1.0);
        assert_eq!(node.position.x, 20.0);
    }

    #[test]
    fn eased_move_passes_through_expected_midpoint() {
        let mut node = node_at(0.0, 0.0);
        let mut action = Action::move_by(100.0, 0.0, 1.0).with_easing(Easing::ease_in());
        action.tick(&mut node, 0.5);
        // t³ at the midpoint.
        assert!((node.position.x - 12.5).abs() < 1e-3);
        action.tick(&mut node, 0.5);
        assert_eq!(node.position.x, 100.0);
    }
}
