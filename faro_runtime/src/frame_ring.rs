//! Bounded in-flight frame handoff between the CPU frame driver and the
//! GPU. The driver claims a slot before mutating the scene for frame N; the
//! renderer signals the slot free once the GPU is done with the buffers of
//! frame N-depth. Blocks only the driver, never logical update code.

use log::warn;
use std::sync::{Arc, Condvar, Mutex};

struct RingShared {
    in_flight: Mutex<usize>,
    freed: Condvar,
}

pub struct FrameRing {
    shared: Arc<RingShared>,
    depth: usize,
}

/// Cloneable handle the renderer keeps to release frame slots.
#[derive(Clone)]
pub struct FrameSignal {
    shared: Arc<RingShared>,
}

impl FrameRing {
    pub fn new(depth: usize) -> Self {
        Self {
            shared: Arc::new(RingShared {
                in_flight: Mutex::new(0),
                freed: Condvar::new(),
            }),
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_flight(&self) -> usize {
        *self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Block until a frame slot is free, then claim it.
    pub fn acquire(&self) {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        while *in_flight >= self.depth {
            in_flight = self
                .shared
                .freed
                .wait(in_flight)
                .unwrap_or_else(|e| e.into_inner());
        }
        *in_flight += 1;
    }

    /// Claim a slot only if one is free.
    pub fn try_acquire(&self) -> bool {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *in_flight >= self.depth {
            return false;
        }
        *in_flight += 1;
        true
    }

    pub fn signaler(&self) -> FrameSignal {
        FrameSignal {
            shared: self.shared.clone(),
        }
    }
}

impl FrameSignal {
    /// Release one frame slot.
    pub fn signal(&self) {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *in_flight == 0 {
            warn!("frame ring: signal with no frame in flight");
            return;
        }
        *in_flight -= 1;
        drop(in_flight);
        self.shared.freed.notify_one();
    }
}
