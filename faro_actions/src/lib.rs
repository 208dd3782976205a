pub mod action;
pub mod easing;

pub use action::{Action, ActionKind, CompletionHandler};
pub use easing::Easing;
