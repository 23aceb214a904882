//! Audio handles for chime - device, listeners, sounds, waveforms and effects
//!
//! Resources are reached through cheap, clonable handles:
//! - Device: engine context and factory (lazy global or explicit)
//! - Listener / Sound / Waveform: `Handle`s over engine-owned objects
//! - Curve: piecewise-linear control curves
//! - CurveEffect: waveform effects driven by curves (e.g. the coin pickup)
//!
//! Dropping the last handle to a resource releases its engine node on the
//! spot. Handles may be null; anything beyond the null checks on a null
//! handle panics.

mod curve;
mod device;
mod effect;
mod error;
mod handle;
mod listener;
mod sound;
mod waveform;

pub use curve::{evaluate, ControlPoint, Curve};
pub use device::Device;
pub use effect::{CurveEffect, EffectState, WaveformControl, NOTE_B4, NOTE_B5, NOTE_E5, NOTE_E6};
pub use error::AudioError;
pub use handle::Handle;
pub use listener::{Listener, ListenerImpl};
pub use sound::{Sound, SoundImpl, SoundKind, SoundStatus};
pub use waveform::{Waveform, WaveformImpl};

pub use chime_engine::{
    AttenuationModel, Cone, EngineConfig, EngineError, Vector3, WaveformKind, DEFAULT_SAMPLE_RATE,
    MAX_LISTENERS,
};
