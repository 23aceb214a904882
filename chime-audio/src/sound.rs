//! Sound handles - file-backed voices
//!
//! Sounds are decoded in full before they play. `SoundKind::Sound` decodes
//! on the calling thread and is spatialized; `SoundKind::Music` decodes on a
//! background thread and is not. A sound whose file fails to decode is still
//! a valid handle: it reports `SoundStatus::Failed`, ignores every command and
//! returns default values from its getters.

use crate::device::Device;
use crate::error::AudioError;
use crate::handle::Handle;
use crate::listener::Listener;
use chime_engine::{
    decode_file, AttenuationModel, Cone, EngineRef, NodeId, NodeKind, SoundVoice, SpatialParams,
    Vector3, VoiceSource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Handle to a loaded sound
pub type Sound = Handle<SoundImpl>;

/// How a sound is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Decoded up front, spatialized
    Sound,
    /// Decoded in the background, not spatialized
    Music,
}

/// Load state of a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundStatus {
    Ready,
    /// Background decode still running
    Loading,
    Failed,
}

/// Implementation object behind a `Sound`
pub struct SoundImpl {
    engine: EngineRef,
    node: NodeId,
    kind: SoundKind,
    path: PathBuf,
}

impl SoundImpl {
    pub(crate) fn load(device: &Device, path: &Path, kind: SoundKind) -> Self {
        let sample_rate = device.sample_rate();
        match kind {
            SoundKind::Sound => {
                let source = match decode_file(path, sample_rate) {
                    Ok(audio) => VoiceSource::Ready(Arc::new(audio)),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), %err, "failed to load sound");
                        VoiceSource::Failed
                    }
                };
                Self::attach(device, path, kind, source)
            }
            SoundKind::Music => {
                let sound = Self::attach(device, path, kind, VoiceSource::Pending);
                sound.spawn_decode(sample_rate);
                sound
            }
        }
    }

    pub(crate) fn try_load(device: &Device, path: &Path, kind: SoundKind) -> Result<Self, AudioError> {
        let audio = decode_file(path, device.sample_rate()).map_err(|source| AudioError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::attach(
            device,
            path,
            kind,
            VoiceSource::Ready(Arc::new(audio)),
        ))
    }

    fn attach(device: &Device, path: &Path, kind: SoundKind, source: VoiceSource) -> Self {
        let voice = SoundVoice::new(source, kind == SoundKind::Sound);
        let node = {
            let mut state = device.engine().lock();
            let graph = state.graph_mut();
            let node = graph.insert(NodeKind::Voice(voice), true);
            if let Err(err) = graph.attach(node) {
                tracing::warn!(?node, %err, "failed to attach sound");
            }
            node
        };
        tracing::debug!(path = %path.display(), ?kind, ?node, "sound created");

        Self {
            engine: device.engine_ref(),
            node,
            kind,
            path: path.to_path_buf(),
        }
    }

    fn spawn_decode(&self, sample_rate: u32) {
        let engine = self.engine.clone();
        let node = self.node;
        let path = self.path.clone();

        let spawned = thread::Builder::new()
            .name("chime-decode".into())
            .spawn(move || {
                let source = match decode_file(&path, sample_rate) {
                    Ok(audio) => VoiceSource::Ready(Arc::new(audio)),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), %err, "failed to load music");
                        VoiceSource::Failed
                    }
                };
                install_source(&engine, node, source);
            });

        if let Err(err) = spawned {
            tracing::warn!(path = %self.path.display(), %err, "failed to start decode thread");
            install_source(&self.engine, self.node, VoiceSource::Failed);
        }
    }

    /// Run `f` on the voice; failed or orphaned sounds return the default
    fn voice<R: Default>(&self, f: impl FnOnce(&mut SoundVoice) -> R) -> R {
        self.engine
            .with(|state| {
                state
                    .graph_mut()
                    .voice_mut(self.node)
                    .filter(|voice| !voice.is_failed())
                    .map(f)
            })
            .flatten()
            .unwrap_or_default()
    }

    /// Run `f` on the voice with `duration` converted to engine frames
    fn voice_after(&self, duration: Duration, f: impl FnOnce(&mut SoundVoice, u64)) {
        self.engine.with(|state| {
            let frames = state.frames_for(duration);
            if let Some(voice) = state.graph_mut().voice_mut(self.node) {
                if !voice.is_failed() {
                    f(voice, frames);
                }
            }
        });
    }

    fn spatial<R: Default>(&self, f: impl FnOnce(&mut SpatialParams) -> R) -> R {
        self.voice(|voice| f(voice.spatial_mut()))
    }

    fn status(&self) -> SoundStatus {
        self.engine
            .with(|state| {
                state.graph().voice(self.node).map(|voice| match voice.source() {
                    VoiceSource::Pending => SoundStatus::Loading,
                    VoiceSource::Ready(_) => SoundStatus::Ready,
                    VoiceSource::Failed => SoundStatus::Failed,
                })
            })
            .flatten()
            .unwrap_or(SoundStatus::Failed)
    }
}

impl Drop for SoundImpl {
    fn drop(&mut self) {
        let node = self.node;
        self.engine.with(|state| {
            let graph = state.graph_mut();
            let _ = graph.detach(node);
            match graph.remove(node) {
                Ok(_) => tracing::debug!(path = %self.path.display(), ?node, "sound released"),
                Err(err) => tracing::warn!(?node, %err, "failed to release sound"),
            }
        });
    }
}

fn install_source(engine: &EngineRef, node: NodeId, source: VoiceSource) {
    // The sound may have been released while decoding
    engine.with(|state| {
        if let Some(voice) = state.graph_mut().voice_mut(node) {
            voice.set_source(source);
        }
    });
}

impl Handle<SoundImpl> {
    /// Load through the global device
    pub fn load(path: impl AsRef<Path>, kind: SoundKind) -> Sound {
        let device = Device::global();
        match kind {
            SoundKind::Sound => device.load_sound(path),
            SoundKind::Music => device.load_music(path),
        }
    }

    /// Replace this handle with a new `Sound` loaded from `path`
    ///
    /// Other copies keep the previous sound.
    pub fn load_sound(&mut self, device: &Device, path: impl AsRef<Path>) {
        self.reset();
        *self = device.load_sound(path);
    }

    /// Replace this handle with new `Music` loaded from `path`
    pub fn load_music(&mut self, device: &Device, path: impl AsRef<Path>) {
        self.reset();
        *self = device.load_music(path);
    }

    #[track_caller]
    pub fn status(&self) -> SoundStatus {
        self.object().status()
    }

    #[track_caller]
    pub fn kind(&self) -> SoundKind {
        self.object().kind
    }

    #[track_caller]
    pub fn path(&self) -> &Path {
        &self.object().path
    }

    #[track_caller]
    pub fn play(&self) {
        self.object().voice(SoundVoice::play);
    }

    /// Stop playback; the position is kept
    #[track_caller]
    pub fn stop(&self) {
        self.object().voice(SoundVoice::stop);
    }

    /// Same as `stop`
    #[track_caller]
    pub fn pause(&self) {
        self.stop();
    }

    /// Play again from the start
    #[track_caller]
    pub fn replay(&self) {
        self.seek(Duration::ZERO);
        self.play();
    }

    /// Move the play position to `position` from the start
    #[track_caller]
    pub fn seek(&self, position: Duration) {
        self.object().voice_after(position, SoundVoice::seek);
    }

    #[track_caller]
    pub fn is_playing(&self) -> bool {
        self.object().voice(|voice| voice.is_playing())
    }

    /// True once a non-looping sound has played to its end
    #[track_caller]
    pub fn is_end(&self) -> bool {
        self.object().voice(|voice| voice.is_at_end())
    }

    #[track_caller]
    pub fn set_looping(&self, looping: bool) {
        self.object().voice(|voice| voice.set_looping(looping));
    }

    #[track_caller]
    pub fn is_looping(&self) -> bool {
        self.object().voice(|voice| voice.is_looping())
    }

    /// Length in seconds (0 until decoded)
    #[track_caller]
    pub fn duration_secs(&self) -> f32 {
        self.object().voice(|voice| voice.duration_secs())
    }

    #[track_caller]
    pub fn set_volume(&self, volume: f32) {
        self.object().voice(|voice| voice.set_volume(volume));
    }

    #[track_caller]
    pub fn volume(&self) -> f32 {
        self.object().voice(|voice| voice.volume())
    }

    #[track_caller]
    pub fn set_pan(&self, pan: f32) {
        self.object().voice(|voice| voice.set_pan(pan));
    }

    #[track_caller]
    pub fn pan(&self) -> f32 {
        self.object().voice(|voice| voice.pan())
    }

    #[track_caller]
    pub fn set_pitch(&self, pitch: f32) {
        self.object().voice(|voice| voice.set_pitch(pitch));
    }

    #[track_caller]
    pub fn pitch(&self) -> f32 {
        self.object().voice(|voice| voice.pitch())
    }

    #[track_caller]
    pub fn set_position(&self, position: impl Into<Vector3>) {
        let position = position.into();
        self.object().spatial(|params| params.position = position);
    }

    #[track_caller]
    pub fn position(&self) -> Vector3 {
        self.object().spatial(|params| params.position)
    }

    #[track_caller]
    pub fn set_direction(&self, direction: impl Into<Vector3>) {
        let direction = direction.into();
        self.object().spatial(|params| params.direction = direction);
    }

    #[track_caller]
    pub fn direction(&self) -> Vector3 {
        self.object().spatial(|params| params.direction)
    }

    #[track_caller]
    pub fn set_velocity(&self, velocity: impl Into<Vector3>) {
        let velocity = velocity.into();
        self.object().spatial(|params| params.velocity = velocity);
    }

    #[track_caller]
    pub fn velocity(&self) -> Vector3 {
        self.object().spatial(|params| params.velocity)
    }

    /// Directional cone (angles in radians)
    #[track_caller]
    pub fn set_cone(&self, inner_angle: f32, outer_angle: f32, outer_gain: f32) {
        let cone = Cone {
            inner_angle,
            outer_angle,
            outer_gain,
        };
        self.object().spatial(|params| params.cone = cone);
    }

    #[track_caller]
    pub fn cone(&self) -> Cone {
        self.object().spatial(|params| params.cone)
    }

    #[track_caller]
    pub fn set_attenuation_model(&self, model: AttenuationModel) {
        self.object().spatial(|params| params.attenuation = model);
    }

    #[track_caller]
    pub fn attenuation_model(&self) -> AttenuationModel {
        self.object().spatial(|params| params.attenuation)
    }

    #[track_caller]
    pub fn set_rolloff(&self, rolloff: f32) {
        self.object().spatial(|params| params.rolloff = rolloff);
    }

    #[track_caller]
    pub fn rolloff(&self) -> f32 {
        self.object().spatial(|params| params.rolloff)
    }

    #[track_caller]
    pub fn set_min_gain(&self, gain: f32) {
        self.object().spatial(|params| params.min_gain = gain);
    }

    #[track_caller]
    pub fn min_gain(&self) -> f32 {
        self.object().spatial(|params| params.min_gain)
    }

    #[track_caller]
    pub fn set_max_gain(&self, gain: f32) {
        self.object().spatial(|params| params.max_gain = gain);
    }

    #[track_caller]
    pub fn max_gain(&self) -> f32 {
        self.object().spatial(|params| params.max_gain)
    }

    #[track_caller]
    pub fn set_min_distance(&self, distance: f32) {
        self.object().spatial(|params| params.min_distance = distance);
    }

    #[track_caller]
    pub fn min_distance(&self) -> f32 {
        self.object().spatial(|params| params.min_distance)
    }

    #[track_caller]
    pub fn set_max_distance(&self, distance: f32) {
        self.object().spatial(|params| params.max_distance = distance);
    }

    #[track_caller]
    pub fn max_distance(&self) -> f32 {
        self.object().spatial(|params| params.max_distance)
    }

    #[track_caller]
    pub fn set_doppler_factor(&self, factor: f32) {
        self.object().spatial(|params| params.doppler_factor = factor);
    }

    #[track_caller]
    pub fn doppler_factor(&self) -> f32 {
        self.object().spatial(|params| params.doppler_factor)
    }

    /// Pin the sound to `listener`; a null listener is ignored
    #[track_caller]
    pub fn set_pinned_listener(&self, listener: &Listener) {
        let object = self.object();
        if listener.is_null() {
            return;
        }
        let index = listener.index();
        object.spatial(|params| params.pinned_listener = Some(index));
    }

    #[track_caller]
    pub fn pinned_listener(&self) -> Option<u32> {
        self.object().spatial(|params| params.pinned_listener)
    }

    /// Fade from the current fade level to `end_volume` over `length`
    #[track_caller]
    pub fn set_fade(&self, end_volume: f32, length: Duration) {
        self.object()
            .voice_after(length, |voice, frames| voice.set_fade(end_volume, frames));
    }

    /// Hold the sound silent until the engine clock reaches `at`
    #[track_caller]
    pub fn set_start_time(&self, at: Duration) {
        self.object().voice_after(at, SoundVoice::set_start_time);
    }

    /// Stop the sound when the engine clock reaches `at`
    #[track_caller]
    pub fn set_stop_time(&self, at: Duration) {
        self.object().voice_after(at, SoundVoice::set_stop_time);
    }
}
