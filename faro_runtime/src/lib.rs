pub mod config;
pub mod frame_ring;
pub mod logging;
pub mod view;

pub use config::ViewConfig;
pub use frame_ring::{FrameRing, FrameSignal};
pub use logging::init_logging;
pub use view::{AppDelegate, NoopDelegate, View};
