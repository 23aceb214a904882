//! Audio engine for chime - mix graph, voices, generators and output
//!
//! This crate provides the engine the handle layer drives:
//! - Engine: cpal output thread (or headless rendering) over shared state
//! - MixGraph: generation-checked node storage and the output bus
//! - Generator: periodic tone sources
//! - SoundVoice: playback of decoded files with fades and scheduling
//! - Decoder: Symphonia decode plus rubato resampling to the engine rate

mod decoder;
mod engine;
mod error;
mod generator;
mod graph;
mod listener;
mod spatial;
mod voice;

pub use decoder::{decode_file, DecodedAudio};
pub use engine::{
    duration_to_frames, Engine, EngineConfig, EngineRef, EngineState, DEFAULT_SAMPLE_RATE, MIX_CHANNELS,
};
pub use error::EngineError;
pub use generator::{Generator, WaveformKind};
pub use graph::{MixGraph, Node, NodeId, NodeKind};
pub use listener::{ListenerSlot, MAX_LISTENERS};
pub use spatial::{AttenuationModel, Cone, SpatialParams, Vector3};
pub use voice::{SoundVoice, VoiceSource};
