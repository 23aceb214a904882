//! Device - the engine context and resource factory
//!
//! A process-wide device is created lazily by `Device::global()`. Explicit
//! devices (including headless ones for tests and offline rendering) can be
//! built with `Device::new` / `Device::headless` and passed by reference.

use crate::error::AudioError;
use crate::listener::{Listener, ListenerImpl};
use crate::sound::{Sound, SoundImpl, SoundKind};
use crate::waveform::{Waveform, WaveformImpl};
use chime_engine::{Engine, EngineConfig, EngineRef, WaveformKind};
use std::path::Path;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Device> = OnceLock::new();

/// Audio device context
pub struct Device {
    engine: Engine,
}

impl Device {
    /// The process-wide device, created on first use
    pub fn global() -> &'static Device {
        GLOBAL.get_or_init(|| Device::new(&EngineConfig::default()))
    }

    /// Install `device` as the process-wide device
    ///
    /// Fails (handing the device back) if the global device already exists.
    pub fn install_global(device: Device) -> Result<&'static Device, Device> {
        GLOBAL.set(device)?;
        Ok(Self::global())
    }

    /// Open the default output, falling back to a headless engine on failure
    pub fn new(config: &EngineConfig) -> Self {
        match Self::try_new(config) {
            Ok(device) => device,
            Err(err) => {
                tracing::error!(%err, "failed to open audio output, running headless");
                Self::headless(config)
            }
        }
    }

    /// Open the default output
    pub fn try_new(config: &EngineConfig) -> Result<Self, AudioError> {
        let engine = Engine::new(config)?;
        Ok(Self { engine })
    }

    /// Device with no output; frames are pulled with `render`
    pub fn headless(config: &EngineConfig) -> Self {
        Self {
            engine: Engine::headless(config),
        }
    }

    pub(crate) fn engine_ref(&self) -> EngineRef {
        self.engine.downgrade()
    }

    /// Listener at `index`, or a null handle when out of range
    pub fn listener(&self, index: u32) -> Listener {
        if index >= self.listener_count() {
            tracing::warn!(index, count = self.listener_count(), "listener index out of range");
            return Listener::null();
        }
        Listener::from_impl(ListenerImpl::new(self.engine_ref(), index))
    }

    pub fn listener_count(&self) -> u32 {
        self.engine.lock().listener_count()
    }

    /// Load a fully decoded, spatialized sound
    ///
    /// A file that fails to decode still yields a valid handle whose status is
    /// `Failed`; it plays silence.
    pub fn load_sound(&self, path: impl AsRef<Path>) -> Sound {
        Sound::from_impl(SoundImpl::load(self, path.as_ref(), SoundKind::Sound))
    }

    /// Load a non-spatialized sound, decoding it on a background thread
    pub fn load_music(&self, path: impl AsRef<Path>) -> Sound {
        Sound::from_impl(SoundImpl::load(self, path.as_ref(), SoundKind::Music))
    }

    /// Like `load_sound`, but report decode failures
    pub fn try_load_sound(&self, path: impl AsRef<Path>) -> Result<Sound, AudioError> {
        SoundImpl::try_load(self, path.as_ref(), SoundKind::Sound).map(Sound::from_impl)
    }

    /// Like `load_music`, but decode up front and report failures
    pub fn try_load_music(&self, path: impl AsRef<Path>) -> Result<Sound, AudioError> {
        SoundImpl::try_load(self, path.as_ref(), SoundKind::Music).map(Sound::from_impl)
    }

    /// Create a stopped waveform attached to the output bus
    pub fn create_waveform(&self, kind: WaveformKind, amplitude: f32, frequency: f32) -> Waveform {
        Waveform::from_impl(WaveformImpl::new(self, kind, amplitude, frequency))
    }

    /// Global gain applied after all voices are mixed
    pub fn set_master_volume(&self, volume: f32) {
        self.engine.lock().set_master_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.engine.lock().master_volume()
    }

    pub fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }

    pub fn is_headless(&self) -> bool {
        self.engine.is_headless()
    }

    /// Pull the next block of interleaved stereo frames from the mix
    pub fn render(&self, output: &mut [f32]) {
        self.engine.render(output);
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }
}
