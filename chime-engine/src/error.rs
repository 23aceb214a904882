//! Engine error type

use thiserror::Error;

/// Errors reported by the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("No audio output device found")]
    NoOutputDevice,
    #[error("Failed to get audio config: {0}")]
    OutputConfig(String),
    #[error("Audio stream error: {0}")]
    Stream(String),
    #[error("Output thread exited before reporting its format")]
    OutputThread,
    #[error("Node does not exist")]
    UnknownNode,
    #[error("Node is still attached to the output bus")]
    NodeAttached,
}
