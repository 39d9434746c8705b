//! Audio error type.

use super::graph::{BufferId, NodeId, Param};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio manager used before init()")]
    NotInitialized,
    #[error("Unknown audio node {0:?}")]
    UnknownNode(NodeId),
    #[error("Unknown audio buffer {0:?}")]
    UnknownBuffer(BufferId),
    #[error("Node {node:?} has no {param:?} parameter")]
    NoSuchParam { node: NodeId, param: Param },
    #[error("Invalid node state: {0}")]
    InvalidState(&'static str),
    #[error("Audio output error: {0}")]
    OutputError(String),
    #[error("WAV recording failed: {0}")]
    Recording(#[from] hound::Error),
    #[error("Invalid audio config: {0}")]
    InvalidConfig(String),
}
