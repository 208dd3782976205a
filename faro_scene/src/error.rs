use faro_ids::NodeID;
use thiserror::Error;

/// Scene-graph misuse. These are engine misuse signals, not crash
/// conditions: the public surface logs them and absorbs the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {node} already has a parent or is already in a scene")]
    AlreadyAttached { node: NodeID },

    #[error("node {node} not found")]
    NotFound { node: NodeID },
}
